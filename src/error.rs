//! Error types for mic-stream.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`RecorderError`]): prevent a capture session from
//!   starting or resuming
//! - **Sink errors** ([`SinkError`]): failures inside a [`Sink`](crate::Sink)
//!   implementation, surfaced via [`RecorderEvent`](crate::RecorderEvent)

/// Fatal errors returned from [`Recorder::start()`] and
/// [`Recorder::resume()`].
///
/// Runtime failures on the audio callback path (a mid-stream conversion
/// error, a slow sink) are never thrown across the real-time boundary;
/// they halt the session internally and are reported through the event
/// callback and [`Recorder::last_error()`].
///
/// [`Recorder::start()`]: crate::Recorder::start
/// [`Recorder::resume()`]: crate::Recorder::resume
/// [`Recorder::last_error()`]: crate::Recorder::last_error
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecorderError {
    /// The requested format, or the (source, target) conversion pair,
    /// cannot be realized.
    #[error("unsupported format: {reason}")]
    Unsupported {
        /// Why the format was rejected.
        reason: String,
    },

    /// The input device is missing, busy, or failed to start or restart.
    #[error("device error: {reason}")]
    DeviceError {
        /// Description coming from the audio backend.
        reason: String,
    },

    /// The conversion step failed mid-stream.
    ///
    /// A failed conversion cannot recover without discarding resampler
    /// continuity, so the session is halted rather than retried.
    #[error("format conversion failed: {reason}")]
    ConversionFailed {
        /// What the converter rejected.
        reason: String,
    },

    /// `start` was called while a session is already recording or paused.
    ///
    /// At most one capture tap may be live per controller; the guard
    /// fails fast instead of installing a second tap.
    #[error("a capture session is already active")]
    AlreadyActive,

    /// The sink failed during initialization.
    #[error("sink '{sink_name}' failed to start: {reason}")]
    SinkStartFailed {
        /// Name of the sink that failed.
        sink_name: String,
        /// Why the sink failed to start.
        reason: String,
    },
}

impl RecorderError {
    /// Creates an `Unsupported` error with the given reason.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Creates a `DeviceError` with the given reason.
    pub fn device(reason: impl Into<String>) -> Self {
        Self::DeviceError {
            reason: reason.into(),
        }
    }

    /// Creates a `ConversionFailed` error with the given reason.
    pub fn conversion(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur within a [`Sink`](crate::Sink) implementation.
///
/// Sink errors never stop the capture; the delivery task emits a
/// [`RecorderEvent::SinkError`](crate::RecorderEvent::SinkError) and
/// moves on to the next buffer.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A write operation failed.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a write failed error with the given reason.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }
}
