//! Sink trait and implementations for converted audio destinations.
//!
//! A [`Sink`] is any destination that can receive converted PCM bytes.
//! The crate ships [`ChannelSink`], which forwards buffers to a tokio
//! mpsc channel; implement the trait yourself for network endpoints,
//! speech APIs, or custom processors.

mod channel;

pub use channel::ChannelSink;

use crate::SinkError;
use async_trait::async_trait;

/// A destination for converted audio bytes.
///
/// The delivery task calls `write` once per converted buffer, in
/// capture order, from the tokio runtime. Buffers are little-endian
/// 16-bit PCM in the session's target format.
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability (`Mutex`, `RwLock`) if needed
/// - All methods are async and run on the tokio runtime, never on the
///   audio thread
/// - `on_start` is called before any audio flows; open resources here
/// - `on_stop` is called during shutdown; close resources here
///
/// # Example
///
/// ```
/// use mic_stream::{Sink, SinkError};
/// use async_trait::async_trait;
///
/// struct PrintSink {
///     name: String,
/// }
///
/// #[async_trait]
/// impl Sink for PrintSink {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     async fn write(&self, buffer: &[u8]) -> Result<(), SinkError> {
///         println!("received {} bytes", buffer.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before any audio flows.
    ///
    /// Use this to open files, establish connections, or allocate
    /// resources. Errors here are fatal and prevent the session from
    /// starting.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Write one buffer of converted PCM bytes.
    ///
    /// Errors are recoverable from the session's point of view: the
    /// delivery task emits a [`RecorderEvent::SinkError`], drops the
    /// buffer, and continues with the next one.
    ///
    /// [`RecorderEvent::SinkError`]: crate::RecorderEvent::SinkError
    async fn write(&self, buffer: &[u8]) -> Result<(), SinkError>;

    /// Called once during shutdown, even after errors.
    ///
    /// Use this to flush buffers, close files, or clean up resources.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
