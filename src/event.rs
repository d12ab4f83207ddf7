//! Runtime events for monitoring capture health.
//!
//! Events are notifications about runtime behavior that cannot be
//! returned to a caller, because there is no caller on the audio thread. A
//! conversion failure halts the session and is reported here (and via
//! [`Recorder::last_error()`](crate::Recorder::last_error)); the other
//! events are informational and capture continues after them.

use std::sync::Arc;

/// Runtime events emitted during capture.
///
/// # Example
///
/// ```
/// use mic_stream::RecorderEvent;
///
/// fn handle_event(event: RecorderEvent) {
///     match event {
///         RecorderEvent::ConversionFailed { reason } => {
///             eprintln!("capture halted: {reason}");
///         }
///         RecorderEvent::BufferDropped { total_dropped } => {
///             eprintln!("delivery queue full, {total_dropped} buffers dropped so far");
///         }
///         RecorderEvent::SinkError { sink_name, error } => {
///             eprintln!("sink '{sink_name}' error: {error}");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// The converter reported an error mid-stream.
    ///
    /// The session is halted: no further buffers reach the sink, and the
    /// byte stream ends without an explicit terminator. Call
    /// [`Recorder::stop()`](crate::Recorder::stop) to tear down.
    ConversionFailed {
        /// What the converter rejected.
        reason: String,
    },

    /// The delivery queue was full and a converted buffer was dropped.
    ///
    /// This happens when the sink is slower than real time for an
    /// extended period. Ordering of the buffers that do arrive is
    /// still preserved.
    BufferDropped {
        /// Buffers dropped so far in this session.
        total_dropped: u64,
    },

    /// The sink returned an error from a write.
    ///
    /// The buffer is skipped and delivery continues with the next one.
    SinkError {
        /// Name of the sink that errored.
        sink_name: String,
        /// Description of the error.
        error: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register via
/// [`Recorder::with_event_callback()`](crate::Recorder::with_event_callback).
/// The callback runs on the delivery task, never on the audio thread,
/// so it may block briefly without risking capture glitches.
pub type EventCallback = Arc<dyn Fn(RecorderEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use mic_stream::{event_callback, RecorderEvent};
///
/// let callback = event_callback(|event| {
///     println!("got event: {event:?}");
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(RecorderEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
