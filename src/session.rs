//! Recording session management.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::delivery::{Delivery, DeliveryCommand};
use crate::device::{CaptureStream, InputDevice};
use crate::format::{AudioFormat, FormatConverter};
use crate::meter::AmplitudeSlot;
use crate::sink::Sink;
use crate::tap::{CaptureTap, ErrorSlot};
use crate::{EventCallback, RecordConfig, RecorderError};

/// Converted buffers the delivery channel holds before the tap starts
/// dropping. At typical callback sizes this is several seconds of audio.
const DELIVERY_CHANNEL_CAPACITY: usize = 64;

/// Tap-side events queued for the delivery task to hand to the user
/// callback. Events past this depth are dropped, not delivered late.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Lifecycle state of a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No session has run yet.
    Idle,
    /// Audio is being captured and delivered.
    Recording,
    /// The device stream is paused; the session can resume.
    Paused,
    /// The last session has been torn down. A new one can start.
    Stopped,
}

/// Resources owned by a running or paused session.
struct ActiveSession {
    stream: CaptureStream,
    halted: Arc<AtomicBool>,
    cmd_tx: mpsc::Sender<DeliveryCommand>,
    delivery_handle: JoinHandle<()>,
}

/// Captures microphone audio and streams converted PCM to a [`Sink`].
///
/// One `Recorder` runs at most one session at a time; after
/// [`stop`](Self::stop) it can start again. The capture stream is not
/// `Send`, so the recorder must live on the thread (or single-threaded
/// task) that created it; the sink itself runs on the tokio runtime
/// and has no such restriction.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use mic_stream::{ChannelSink, RecordConfig, Recorder};
/// use tokio::sync::mpsc;
///
/// # async fn run() -> Result<(), mic_stream::RecorderError> {
/// let (tx, mut rx) = mpsc::channel::<Vec<u8>>(100);
/// let mut recorder = Recorder::new(Arc::new(ChannelSink::new(tx)));
///
/// recorder.start(RecordConfig::default()).await?;
/// while let Some(bytes) = rx.recv().await {
///     // 16-bit little-endian PCM at the configured rate
///     let _ = bytes;
/// }
/// recorder.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Recorder {
    sink: Arc<dyn Sink>,
    event_callback: Option<EventCallback>,
    amplitude: AmplitudeSlot,
    error_slot: ErrorSlot,
    state: RecorderState,
    active: Option<ActiveSession>,
}

impl Recorder {
    /// Creates a recorder that will deliver audio to `sink`.
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            event_callback: None,
            amplitude: AmplitudeSlot::new(),
            error_slot: Arc::new(Mutex::new(None)),
            state: RecorderState::Idle,
            active: None,
        }
    }

    /// Sets the event callback for non-fatal notifications.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Peak level of the most recent converted buffer, in dBFS.
    ///
    /// Reads [`SILENCE_FLOOR_DBFS`](crate::SILENCE_FLOOR_DBFS) before
    /// the first buffer and after teardown. Safe to poll from a UI
    /// timer; it never blocks.
    pub fn get_amplitude(&self) -> f32 {
        self.amplitude.load()
    }

    /// Takes the first fatal capture error of the current session.
    ///
    /// Conversion failures happen on the audio thread and cannot be
    /// returned from any method call; they halt capture and park the
    /// error here. Returns `None` if nothing failed, and clears the
    /// slot on read.
    pub fn last_error(&self) -> Option<RecorderError> {
        self.error_slot.lock().take()
    }

    /// Starts a capture session.
    ///
    /// Resolves the input device, builds the conversion pipeline for
    /// the device's native format, starts the sink, and begins
    /// capturing. Audio flows until [`pause`](Self::pause) or
    /// [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// - [`RecorderError::AlreadyActive`] if a session is recording or
    ///   paused.
    /// - [`RecorderError::Unsupported`] for invalid configs or device
    ///   formats the pipeline cannot consume.
    /// - [`RecorderError::DeviceError`] if the device is missing or the
    ///   stream cannot start.
    /// - [`RecorderError::SinkStartFailed`] if the sink rejects
    ///   `on_start`; the device is left untouched.
    pub async fn start(&mut self, config: RecordConfig) -> Result<(), RecorderError> {
        if matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            return Err(RecorderError::AlreadyActive);
        }
        config.validate()?;

        if config.echo_cancel {
            warn!("echo cancellation requested but not applied on this backend");
        }
        if config.auto_gain {
            warn!("automatic gain control requested but not applied on this backend");
        }

        let device = InputDevice::resolve(config.device_id.as_deref())?;
        let source = device.source_format()?;
        let target = AudioFormat::target(config.sample_rate, config.num_channels);
        let converter = FormatConverter::new(source, target)?;

        self.amplitude.reset();
        *self.error_slot.lock() = None;

        self.sink
            .on_start()
            .await
            .map_err(|e| RecorderError::SinkStartFailed {
                sink_name: self.sink.name().to_string(),
                reason: e.to_string(),
            })?;

        let (byte_tx, byte_rx) = mpsc::channel(DELIVERY_CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let halted = Arc::new(AtomicBool::new(false));

        let delivery = Delivery::new(self.sink.clone(), self.event_callback.clone());
        let delivery_handle = tokio::spawn(delivery.run(byte_rx, cmd_rx, event_rx));

        let tap = CaptureTap::new(
            converter,
            self.amplitude.clone(),
            byte_tx,
            event_tx,
            halted.clone(),
            self.error_slot.clone(),
        );

        let stream = match device.start(tap) {
            Ok(stream) => stream,
            Err(e) => {
                // The sink already started; shut its delivery task down.
                let _ = cmd_tx.send(DeliveryCommand::Stop).await;
                let _ = delivery_handle.await;
                return Err(e);
            }
        };

        info!(
            device = %device.name(),
            source_rate = source.sample_rate,
            source_channels = source.channels,
            target_rate = target.sample_rate,
            target_channels = target.channels,
            sink = self.sink.name(),
            "recording started"
        );

        self.active = Some(ActiveSession {
            stream,
            halted,
            cmd_tx,
            delivery_handle,
        });
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Pauses capture.
    ///
    /// Only meaningful while recording; in any other state this is a
    /// no-op. The device stream stays open, the delivery task stays
    /// alive, and conversion state is kept so resumed audio continues
    /// seamlessly. A stream that refuses to pause is logged and the
    /// session still moves to [`RecorderState::Paused`]; its buffers
    /// keep flowing until the backend settles.
    pub fn pause(&mut self) {
        if self.state != RecorderState::Recording {
            return;
        }
        if let Some(active) = &self.active {
            if let Err(e) = active.stream.pause() {
                warn!(error = %e, "device stream did not pause cleanly");
            }
        }
        self.state = RecorderState::Paused;
        info!("recording paused");
    }

    /// Resumes a paused session.
    ///
    /// In any state other than [`RecorderState::Paused`] this is a
    /// no-op that returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::DeviceError`] if the device stream
    /// cannot be restarted; the session stays paused.
    pub fn resume(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Paused {
            return Ok(());
        }
        if let Some(active) = &self.active {
            active.stream.resume()?;
        }
        self.state = RecorderState::Recording;
        info!("recording resumed");
        Ok(())
    }

    /// Stops the session and tears down the pipeline.
    ///
    /// The device stream is closed first, then the delivery task is
    /// told to stop; buffers still queued at that point are discarded
    /// rather than delivered. The sink's `on_stop` runs before this
    /// returns. Idempotent: stopping an idle or stopped recorder does
    /// nothing.
    ///
    /// Returns the path of a recording artifact when the sink produced
    /// one; streaming sinks yield `None`.
    pub async fn stop(&mut self) -> Option<PathBuf> {
        self.teardown().await;
        None
    }

    /// Stops the session, discarding any buffered audio.
    ///
    /// Same teardown as [`stop`](Self::stop); the distinction matters
    /// to callers that treat stop as completion and cancel as
    /// abandonment. Never fails: a session that will not shut down
    /// cleanly is abandoned anyway.
    pub async fn cancel(&mut self) -> Result<(), RecorderError> {
        self.teardown().await;
        Ok(())
    }

    /// Releases all resources.
    ///
    /// Equivalent to [`stop`](Self::stop) for this backend; the
    /// recorder can still start a new session afterwards.
    pub async fn dispose(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        let Some(active) = self.active.take() else {
            if self.state != RecorderState::Idle {
                self.state = RecorderState::Stopped;
            }
            return;
        };

        // Halt the tap before the stream drops so a concurrent callback
        // exits early instead of pushing into a closing channel.
        active.halted.store(true, Ordering::Release);
        drop(active.stream);

        let _ = active.cmd_tx.send(DeliveryCommand::Stop).await;
        let _ = active.delivery_handle.await;

        self.amplitude.reset();
        self.state = RecorderState::Stopped;
        info!("recording stopped");
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            // Best effort: stop the callback and nudge the delivery
            // task; the stream itself stops when `active` drops here.
            active.halted.store(true, Ordering::Release);
            let _ = active.cmd_tx.try_send(DeliveryCommand::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::SILENCE_FLOOR_DBFS;
    use crate::{ChannelSink, SinkError};
    use async_trait::async_trait;

    fn recorder() -> Recorder {
        let (tx, _rx) = mpsc::channel::<Vec<u8>>(4);
        Recorder::new(Arc::new(ChannelSink::new(tx)))
    }

    #[test]
    fn test_new_recorder_is_idle() {
        let recorder = recorder();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.get_amplitude(), SILENCE_FLOOR_DBFS);
        assert!(recorder.last_error().is_none());
    }

    #[test]
    fn test_pause_outside_recording_is_noop() {
        let mut recorder = recorder();
        recorder.pause();
        assert_eq!(recorder.state(), RecorderState::Idle);

        recorder.state = RecorderState::Stopped;
        recorder.pause();
        assert_eq!(recorder.state(), RecorderState::Stopped);
    }

    #[test]
    fn test_resume_outside_paused_is_noop() {
        let mut recorder = recorder();
        assert!(recorder.resume().is_ok());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_start_rejects_active_session() {
        let mut recorder = recorder();
        recorder.state = RecorderState::Recording;
        let result = recorder.start(RecordConfig::default()).await;
        assert!(matches!(result, Err(RecorderError::AlreadyActive)));

        recorder.state = RecorderState::Paused;
        let result = recorder.start(RecordConfig::default()).await;
        assert!(matches!(result, Err(RecorderError::AlreadyActive)));
    }

    #[tokio::test]
    async fn test_start_validates_config_before_touching_hardware() {
        let mut recorder = recorder();
        let config = RecordConfig {
            sample_rate: 0,
            ..RecordConfig::default()
        };
        let result = recorder.start(config).await;
        assert!(matches!(result, Err(RecorderError::Unsupported { .. })));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut recorder = recorder();
        recorder.state = RecorderState::Recording;
        assert!(recorder.stop().await.is_none());
        assert_eq!(recorder.state(), RecorderState::Stopped);
        assert!(recorder.stop().await.is_none());
        assert_eq!(recorder.state(), RecorderState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_from_idle_leaves_idle() {
        // Stopping before anything started is allowed and harmless.
        let mut recorder = recorder();
        assert!(recorder.stop().await.is_none());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_never_fails() {
        let mut recorder = recorder();
        assert!(recorder.cancel().await.is_ok());
        assert!(recorder.cancel().await.is_ok());
    }

    #[test]
    fn test_last_error_takes_the_error() {
        let recorder = recorder();
        *recorder.error_slot.lock() = Some(RecorderError::conversion("boom"));
        assert!(recorder.last_error().is_some());
        assert!(recorder.last_error().is_none());
    }

    struct RefusingSink;

    #[async_trait]
    impl Sink for RefusingSink {
        fn name(&self) -> &str {
            "refusing"
        }

        async fn on_start(&self) -> Result<(), SinkError> {
            Err(SinkError::custom("no thanks"))
        }

        async fn write(&self, _buffer: &[u8]) -> Result<(), SinkError> {
            Ok(())
        }
    }

    // Requires a default input device: sink startup runs after device
    // resolution, so without hardware the device error masks it.
    #[tokio::test]
    #[ignore = "requires audio hardware"]
    async fn test_sink_start_failure_aborts_start() {
        let mut recorder = Recorder::new(Arc::new(RefusingSink));
        let result = recorder.start(RecordConfig::default()).await;
        assert!(matches!(
            result,
            Err(RecorderError::SinkStartFailed { .. })
        ));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }
}
