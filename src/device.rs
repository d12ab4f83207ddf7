//! CPAL input device wrapper.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig as CpalStreamConfig};
use tracing::{debug, info};

use crate::format::{i16_to_f32, AudioFormat};
use crate::tap::CaptureTap;
use crate::RecorderError;

/// Names of all input devices visible to the current audio host.
///
/// Devices whose names cannot be read are skipped.
pub fn list_input_devices() -> Result<Vec<String>, RecorderError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| RecorderError::device(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Name of the system default input device, if one is configured.
pub fn default_input_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .and_then(|d| d.name().ok())
}

/// Wrapper around a CPAL audio input device.
///
/// Handles device selection and stream construction; the stream's
/// callback hands every buffer to a [`CaptureTap`].
#[must_use]
pub(crate) struct InputDevice {
    device: Device,
}

impl InputDevice {
    /// Resolves a device: by name when given, the system default otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::DeviceError`] if no default device is
    /// configured, no device matches the name, or the host cannot be
    /// queried.
    pub(crate) fn resolve(name: Option<&str>) -> Result<Self, RecorderError> {
        let host = cpal::default_host();

        let Some(name) = name else {
            let device = host
                .default_input_device()
                .ok_or_else(|| RecorderError::device("no default input device"))?;
            return Ok(Self { device });
        };

        let devices = host
            .input_devices()
            .map_err(|e| RecorderError::device(e.to_string()))?;
        for device in devices {
            if device.name().is_ok_and(|n| n == name) {
                return Ok(Self { device });
            }
        }
        Err(RecorderError::device(format!(
            "input device not found: {name}"
        )))
    }

    /// Returns the device name.
    pub(crate) fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }

    /// The format the device will actually capture at.
    ///
    /// Samples always enter the pipeline as f32; the reported format
    /// carries the device's native rate and channel count.
    pub(crate) fn source_format(&self) -> Result<AudioFormat, RecorderError> {
        let config = self
            .device
            .default_input_config()
            .map_err(|e| RecorderError::device(e.to_string()))?;
        match config.sample_format() {
            SampleFormat::F32 | SampleFormat::I16 => Ok(AudioFormat::source(
                config.sample_rate().0,
                config.channels(),
            )),
            format => Err(RecorderError::unsupported(format!(
                "device sample format {format:?}"
            ))),
        }
    }

    /// Builds and starts the input stream, moving `tap` into its callback.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::DeviceError`] if the stream cannot be
    /// built or started.
    pub(crate) fn start(&self, tap: CaptureTap) -> Result<CaptureStream, RecorderError> {
        let supported_config = self
            .device
            .default_input_config()
            .map_err(|e| RecorderError::device(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let cpal_config: CpalStreamConfig = supported_config.into();

        let stream = match sample_format {
            SampleFormat::F32 => self.build_f32_stream(&cpal_config, tap)?,
            SampleFormat::I16 => self.build_i16_stream(&cpal_config, tap)?,
            format => {
                return Err(RecorderError::unsupported(format!(
                    "device sample format {format:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| RecorderError::device(e.to_string()))?;

        info!(device = %self.name(), "capture stream started");
        Ok(CaptureStream { stream })
    }

    fn build_f32_stream(
        &self,
        config: &CpalStreamConfig,
        mut tap: CaptureTap,
    ) -> Result<Stream, RecorderError> {
        self.device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    tap.process(data);
                },
                |err| {
                    tracing::error!("audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| RecorderError::device(e.to_string()))
    }

    fn build_i16_stream(
        &self,
        config: &CpalStreamConfig,
        mut tap: CaptureTap,
    ) -> Result<Stream, RecorderError> {
        // Reused scratch keeps the callback allocation-free after the
        // first few buffers.
        let mut scratch: Vec<f32> = Vec::new();
        self.device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| i16_to_f32(s)));
                    tap.process(&scratch);
                },
                |err| {
                    tracing::error!("audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| RecorderError::device(e.to_string()))
    }
}

/// A running audio capture stream.
///
/// Capture continues while this struct is held; dropping it stops the
/// CPAL stream and releases the device.
pub(crate) struct CaptureStream {
    stream: Stream,
}

impl CaptureStream {
    /// Pauses capture; the device stops invoking the callback.
    pub(crate) fn pause(&self) -> Result<(), RecorderError> {
        self.stream
            .pause()
            .map_err(|e| RecorderError::device(e.to_string()))
    }

    /// Resumes a paused stream.
    pub(crate) fn resume(&self) -> Result<(), RecorderError> {
        debug!("resuming capture stream");
        self.stream
            .play()
            .map_err(|e| RecorderError::device(e.to_string()))
    }
}
