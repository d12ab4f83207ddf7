//! # mic-stream
//!
//! Live microphone capture with format conversion and async delivery.
//!
//! `mic-stream` opens an input device via CPAL, converts the device's
//! native format to a requested rate and channel count, meters peak
//! amplitude, and streams the result as little-endian 16-bit PCM bytes
//! to an async [`Sink`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mic_stream::{ChannelSink, RecordConfig, Recorder};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel::<Vec<u8>>(100);
//! let mut recorder = Recorder::new(Arc::new(ChannelSink::new(tx)))
//!     .with_event_callback(mic_stream::event_callback(|e| {
//!         tracing::warn!(?e, "recorder event");
//!     }));
//!
//! recorder.start(RecordConfig::default()).await?;
//!
//! // Consume converted audio as it arrives
//! while let Some(bytes) = rx.recv().await {
//!     // Send to a speech API, write to disk, etc.
//! }
//!
//! recorder.stop().await;
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **CPAL Thread**: The audio callback converts, meters, and pushes
//!   bytes with a non-blocking send; it never waits on the sink
//! - **Bounded Channel**: Absorbs pressure from a slow consumer; when
//!   full, whole buffers are dropped and counted
//! - **Tokio Runtime**: A delivery task drains the channel and calls
//!   the sink in capture order
//!
//! Sink latency therefore never interrupts capture, and the amplitude
//! meter stays readable from any thread.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod config;
mod delivery;
mod device;
mod error;
mod event;
pub mod format;
mod meter;
mod session;
mod sink;
mod tap;

pub use config::RecordConfig;
pub use device::{default_input_device_name, list_input_devices};
pub use error::{RecorderError, SinkError};
pub use event::{event_callback, EventCallback, RecorderEvent};
pub use meter::{peak_dbfs, AmplitudeSlot, SILENCE_FLOOR_DBFS};
pub use session::{Recorder, RecorderState};
pub use sink::{ChannelSink, Sink};
