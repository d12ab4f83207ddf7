//! Audio formats and the streaming format converter.
//!
//! Conversion covers the three mismatches between a live input device
//! and the requested output:
//! - Channel up/down-mixing
//! - Sample rate conversion (stateful, continuous across buffers)
//! - Sample representation (f32 → 16-bit signed PCM)

mod convert;
mod converter;
mod resample;

pub use convert::{f32_to_i16, i16_to_f32, i16_to_le_bytes, mix_channels};
pub use converter::FormatConverter;
pub use resample::StreamResampler;

/// How samples are represented in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRepr {
    /// 32-bit IEEE float in `[-1.0, 1.0]`.
    F32,
    /// 16-bit signed integer.
    I16,
}

/// How channels are laid out within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// Frames hold one sample per channel: `L R L R ...`
    Interleaved,
    /// Each channel occupies its own contiguous run.
    ///
    /// Recognized for completeness; the converter only accepts
    /// interleaved buffers.
    Planar,
}

/// Describes a buffer's layout: rate, channels, representation.
///
/// Two instances exist per session: the source format, fixed from the
/// live input device at start, and the target format, derived from
/// [`RecordConfig`](crate::RecordConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample representation.
    pub repr: SampleRepr,
    /// Channel layout.
    pub layout: SampleLayout,
}

impl AudioFormat {
    /// A capture-side format: interleaved f32, as cpal delivers it.
    pub fn source(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            repr: SampleRepr::F32,
            layout: SampleLayout::Interleaved,
        }
    }

    /// An output-side format: interleaved 16-bit signed PCM.
    pub fn target(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            repr: SampleRepr::I16,
            layout: SampleLayout::Interleaved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_is_interleaved_f32() {
        let format = AudioFormat::source(48000, 2);
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.channels, 2);
        assert_eq!(format.repr, SampleRepr::F32);
        assert_eq!(format.layout, SampleLayout::Interleaved);
    }

    #[test]
    fn test_target_format_is_interleaved_i16() {
        let format = AudioFormat::target(16000, 1);
        assert_eq!(format.repr, SampleRepr::I16);
        assert_eq!(format.layout, SampleLayout::Interleaved);
    }

    #[test]
    fn test_format_equality() {
        assert_eq!(AudioFormat::source(48000, 2), AudioFormat::source(48000, 2));
        assert_ne!(AudioFormat::source(48000, 2), AudioFormat::target(48000, 2));
    }
}
