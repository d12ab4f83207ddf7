//! Format conversion pipeline: channel mixdown, resampling, quantization.

use tracing::debug;

use crate::format::{
    convert::{f32_to_i16, mix_channels},
    AudioFormat, SampleLayout, SampleRepr, StreamResampler,
};
use crate::RecorderError;

/// Converts captured audio from one [`AudioFormat`] to another.
///
/// A converter is built once per session and fed every captured buffer
/// in order. It owns a [`StreamResampler`], so conversion state (read
/// phase, interpolation history) survives across buffers; the same
/// signal split differently across calls converts identically. All
/// intermediate storage is reused, so steady-state conversion does not
/// allocate and is safe on the audio callback path.
pub struct FormatConverter {
    source: AudioFormat,
    target: AudioFormat,
    resampler: StreamResampler,
    /// Scratch for the channel mixdown stage, reused across calls.
    mixed: Vec<f32>,
    /// Scratch for the resampler output, reused across calls.
    resampled: Vec<f32>,
    /// Scratch for the quantized output, reused across calls.
    quantized: Vec<i16>,
}

impl FormatConverter {
    /// Creates a converter from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Unsupported`] for zero sample rates or
    /// channel counts, planar layouts on either side, a non-f32 source
    /// representation, or a non-i16 target representation.
    pub fn new(source: AudioFormat, target: AudioFormat) -> Result<Self, RecorderError> {
        for format in [&source, &target] {
            if format.sample_rate == 0 {
                return Err(RecorderError::unsupported("sample rate must be non-zero"));
            }
            if format.channels == 0 {
                return Err(RecorderError::unsupported("channel count must be non-zero"));
            }
            if format.layout == SampleLayout::Planar {
                return Err(RecorderError::unsupported(
                    "planar sample layouts are not supported",
                ));
            }
        }
        if source.repr != SampleRepr::F32 {
            return Err(RecorderError::unsupported(
                "converter input must be f32 samples",
            ));
        }
        if target.repr != SampleRepr::I16 {
            return Err(RecorderError::unsupported(
                "converter output must be 16-bit samples",
            ));
        }

        let resampler =
            StreamResampler::new(source.sample_rate, target.sample_rate, target.channels)?;

        debug!(
            source_rate = source.sample_rate,
            source_channels = source.channels,
            target_rate = target.sample_rate,
            target_channels = target.channels,
            "created format converter"
        );

        Ok(Self {
            source,
            target,
            resampler,
            mixed: Vec::new(),
            resampled: Vec::new(),
            quantized: Vec::new(),
        })
    }

    /// Converts one buffer of interleaved source-format f32 samples.
    ///
    /// Stages run in order: channel mixdown, then resampling, then
    /// quantization to 16-bit PCM. The returned slice points into
    /// internal scratch and is valid until the next call; an empty
    /// input yields an empty output with resampler state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::ConversionFailed`] if the input length
    /// is not a whole number of source-format frames.
    pub fn convert(&mut self, input: &[f32]) -> Result<&[i16], RecorderError> {
        if input.len() % self.source.channels as usize != 0 {
            return Err(RecorderError::conversion(format!(
                "buffer of {} samples is not a whole number of {}-channel frames",
                input.len(),
                self.source.channels
            )));
        }

        mix_channels(
            input,
            self.source.channels,
            self.target.channels,
            &mut self.mixed,
        );
        self.resampler.process(&self.mixed, &mut self.resampled);

        self.quantized.clear();
        self.quantized
            .extend(self.resampled.iter().copied().map(f32_to_i16));
        Ok(&self.quantized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(src_rate: u32, src_ch: u16, dst_rate: u32, dst_ch: u16) -> FormatConverter {
        FormatConverter::new(
            AudioFormat::source(src_rate, src_ch),
            AudioFormat::target(dst_rate, dst_ch),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_planar_layout() {
        let mut planar = AudioFormat::source(48000, 2);
        planar.layout = SampleLayout::Planar;
        let result = FormatConverter::new(planar, AudioFormat::target(16000, 1));
        assert!(matches!(result, Err(RecorderError::Unsupported { .. })));
    }

    #[test]
    fn test_rejects_zero_rate_and_channels() {
        assert!(FormatConverter::new(
            AudioFormat::source(0, 1),
            AudioFormat::target(16000, 1)
        )
        .is_err());
        assert!(FormatConverter::new(
            AudioFormat::source(48000, 0),
            AudioFormat::target(16000, 1)
        )
        .is_err());
    }

    #[test]
    fn test_rejects_mismatched_representations() {
        // f32 target and i16 source are both outside the pipeline.
        assert!(FormatConverter::new(
            AudioFormat::source(48000, 1),
            AudioFormat::source(16000, 1)
        )
        .is_err());
        assert!(FormatConverter::new(
            AudioFormat::target(48000, 1),
            AudioFormat::target(16000, 1)
        )
        .is_err());
    }

    #[test]
    fn test_rejects_partial_frame() {
        let mut c = converter(48000, 2, 16000, 1);
        assert!(matches!(
            c.convert(&[0.0; 5]),
            Err(RecorderError::ConversionFailed { .. })
        ));
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let mut c = converter(48000, 1, 16000, 1);
        assert!(c.convert(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_stereo_48k_to_mono_16k() {
        let mut c = converter(48000, 2, 16000, 1);
        let mut samples = Vec::new();
        for _ in 0..480 {
            samples.push(0.5f32);
            samples.push(0.5f32);
        }
        let out = c.convert(&samples).unwrap();

        assert_eq!(out.len(), 160);
        // Constant 0.5 input quantizes near 0.5 * 32767 once history fills.
        for &s in out.iter().skip(4) {
            assert!((i32::from(s) - 16384).abs() <= 2, "sample {s}");
        }
    }

    #[test]
    fn test_output_frame_count_tracks_ratio() {
        let mut c = converter(44100, 1, 16000, 1);
        let input = vec![0.0f32; 441];
        let exact = 441.0 * 16000.0 / 44100.0;
        for _ in 0..20 {
            let out = c.convert(&input).unwrap();
            assert!((out.len() as f64 - exact).abs() <= 1.0);
        }
    }

    #[test]
    fn test_conversion_state_survives_buffer_splits() {
        let ramp: Vec<f32> = (0..960).map(|i| i as f32 / 960.0).collect();

        let mut whole = converter(48000, 1, 16000, 1);
        let out_whole = whole.convert(&ramp).unwrap().to_vec();

        let mut split = converter(48000, 1, 16000, 1);
        let mut joined = split.convert(&ramp[..400]).unwrap().to_vec();
        joined.extend_from_slice(split.convert(&ramp[400..]).unwrap());

        assert_eq!(out_whole, joined);
    }
}
