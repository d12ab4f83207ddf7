//! Tokio mpsc channel sink implementation.

use crate::sink::Sink;
use crate::SinkError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A sink that forwards converted PCM buffers to a tokio mpsc channel.
///
/// This is the primary way to receive audio bytes for processing
/// (transcription, streaming upload, analysis).
///
/// # Example
///
/// ```
/// use mic_stream::ChannelSink;
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<Vec<u8>>(100);
/// let sink = ChannelSink::new(tx);
///
/// // Hand the sink to a Recorder, then receive buffers:
/// // while let Some(bytes) = rx.recv().await { ... }
/// ```
pub struct ChannelSink {
    name: String,
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChannelSink {
    /// Creates a new channel sink with the given sender.
    ///
    /// The sender should have sufficient buffer capacity for your use
    /// case. A capacity of 100 is typically sufficient.
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

#[async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, buffer: &[u8]) -> Result<(), SinkError> {
        self.sender
            .send(buffer.to_vec())
            .await
            .map_err(|_| SinkError::ChannelClosed)
    }
}
