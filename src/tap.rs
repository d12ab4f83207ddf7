//! Capture tap - the per-callback stage between device and delivery.
//!
//! The tap runs inside the audio callback, so everything here is
//! bounded work: format conversion into reused scratch, one peak
//! measurement, non-blocking channel pushes. It never blocks on the
//! sink and never runs consumer code: events are forwarded through a
//! channel and the callback is applied by the delivery task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::format::{i16_to_le_bytes, FormatConverter};
use crate::meter::{peak_dbfs, AmplitudeSlot};
use crate::{RecorderError, RecorderEvent};

/// Shared slot for the first fatal capture error of a session.
pub(crate) type ErrorSlot = Arc<Mutex<Option<RecorderError>>>;

/// Per-session state driven by the audio callback.
///
/// A tap is created at start and moved into the device stream closure.
/// When conversion fails the tap halts itself: it parks the error for
/// [`Recorder::last_error`](crate::Recorder::last_error), raises the
/// shared `halted` flag, and ignores every later callback. Teardown of
/// the stream itself happens on the control side; the callback never
/// tears down the device that is invoking it.
pub(crate) struct CaptureTap {
    converter: FormatConverter,
    amplitude: AmplitudeSlot,
    byte_tx: mpsc::Sender<Vec<u8>>,
    /// Events queued here reach the user callback via the delivery
    /// task. Best effort: a full event queue drops the notification.
    event_tx: mpsc::Sender<RecorderEvent>,
    halted: Arc<AtomicBool>,
    error_slot: ErrorSlot,
    /// Buffers dropped because the delivery channel was full.
    dropped: u64,
}

impl CaptureTap {
    pub(crate) fn new(
        converter: FormatConverter,
        amplitude: AmplitudeSlot,
        byte_tx: mpsc::Sender<Vec<u8>>,
        event_tx: mpsc::Sender<RecorderEvent>,
        halted: Arc<AtomicBool>,
        error_slot: ErrorSlot,
    ) -> Self {
        Self {
            converter,
            amplitude,
            byte_tx,
            event_tx,
            halted,
            error_slot,
            dropped: 0,
        }
    }

    /// Handles one callback's worth of interleaved f32 samples.
    pub(crate) fn process(&mut self, samples: &[f32]) {
        if self.halted.load(Ordering::Acquire) {
            return;
        }

        let pcm = match self.converter.convert(samples) {
            Ok(pcm) => pcm,
            Err(e) => {
                error!(error = %e, "format conversion failed, halting capture");
                *self.error_slot.lock() = Some(e.clone());
                self.halted.store(true, Ordering::Release);
                let _ = self.event_tx.try_send(RecorderEvent::ConversionFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };
        if pcm.is_empty() {
            // Resampler phase can swallow a very short block entirely.
            return;
        }

        let level = peak_dbfs(pcm);
        let bytes = i16_to_le_bytes(pcm);
        self.amplitude.store(level);

        match self.byte_tx.try_send(bytes) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!(total_dropped = self.dropped, "delivery channel full, dropping buffer");
                let _ = self.event_tx.try_send(RecorderEvent::BufferDropped {
                    total_dropped: self.dropped,
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Delivery is gone; the session is shutting down.
                self.halted.store(true, Ordering::Release);
            }
        }
    }
}
