//! Per-session recording configuration.

use crate::RecorderError;

/// Immutable configuration supplied once at session start.
///
/// Describes the **target** output format, meaning what the
/// [`Sink`](crate::Sink) receives regardless of what the input device
/// natively captures.
/// The converter bridges the two.
///
/// # Example
///
/// ```
/// use mic_stream::RecordConfig;
///
/// let config = RecordConfig {
///     sample_rate: 16000,
///     num_channels: 1,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Target sample rate in Hz.
    pub sample_rate: u32,

    /// Target channel count (1 = mono, 2 = stereo).
    pub num_channels: u16,

    /// Input device name, or `None` for the system default.
    pub device_id: Option<String>,

    /// Request echo cancellation from the platform.
    ///
    /// Best effort: backends without the capability log a warning and
    /// capture without it.
    pub echo_cancel: bool,

    /// Request automatic gain control from the platform.
    ///
    /// Best effort, same caveat as [`echo_cancel`](Self::echo_cancel).
    pub auto_gain: bool,
}

impl Default for RecordConfig {
    /// 16kHz mono, the format speech pipelines expect.
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            num_channels: 1,
            device_id: None,
            echo_cancel: false,
            auto_gain: false,
        }
    }
}

impl RecordConfig {
    /// Checks that the target format can be represented.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Unsupported`] for a zero sample rate or
    /// zero channel count.
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::unsupported("target sample rate is 0 Hz"));
        }
        if self.num_channels == 0 {
            return Err(RecorderError::unsupported("target channel count is 0"));
        }
        Ok(())
    }
}
