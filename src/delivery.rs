//! Delivery task that forwards converted audio to the sink.
//!
//! The audio callback pushes serialized buffers into a bounded channel;
//! this task drains the channel on the tokio runtime and calls the
//! sink, so sink latency never touches the capture thread. Buffers
//! reach the sink in capture order because a single task does all the
//! writing. The user event callback is applied here too: the tap
//! forwards its events through a channel rather than running consumer
//! code inside the audio callback.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::sink::Sink;
use crate::{EventCallback, RecorderEvent};

/// Command sent to the delivery task.
pub(crate) enum DeliveryCommand {
    /// Stop immediately, discarding buffers still in the channel.
    Stop,
}

/// Forwards converted PCM buffers from the capture path to the sink.
pub(crate) struct Delivery {
    sink: Arc<dyn Sink>,
    event_callback: Option<EventCallback>,
}

impl Delivery {
    pub(crate) fn new(sink: Arc<dyn Sink>, event_callback: Option<EventCallback>) -> Self {
        Self {
            sink,
            event_callback,
        }
    }

    fn emit_event(&self, event: RecorderEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Writes one buffer to the sink.
    ///
    /// A failed write is reported through the event callback and the
    /// buffer is dropped; the stream continues with the next one.
    async fn write_buffer(&self, buffer: &[u8]) {
        if let Err(e) = self.sink.write(buffer).await {
            warn!(sink = self.sink.name(), error = %e, "sink write failed");
            self.emit_event(RecorderEvent::SinkError {
                sink_name: self.sink.name().to_string(),
                error: e.to_string(),
            });
        }
    }

    /// Runs the delivery loop until stopped or both channels close.
    ///
    /// Stop is checked before the next buffer, so anything still queued
    /// when the command arrives is discarded rather than delivered.
    pub(crate) async fn run(
        self,
        mut byte_rx: mpsc::Receiver<Vec<u8>>,
        mut cmd_rx: mpsc::Receiver<DeliveryCommand>,
        mut event_rx: mpsc::Receiver<RecorderEvent>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(cmd) = cmd_rx.recv() => {
                    match cmd {
                        DeliveryCommand::Stop => break,
                    }
                }
                Some(event) = event_rx.recv() => {
                    self.emit_event(event);
                }
                Some(buffer) = byte_rx.recv() => {
                    self.write_buffer(&buffer).await;
                }
                else => break,
            }
        }

        if let Err(e) = self.sink.on_stop().await {
            self.emit_event(RecorderEvent::SinkError {
                sink_name: self.sink.name().to_string(),
                error: format!("error during shutdown: {e}"),
            });
        }
        debug!(sink = self.sink.name(), "delivery task finished");
    }
}
