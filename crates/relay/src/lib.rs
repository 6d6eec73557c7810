//! Named live-stream registry and per-stream consumer fan-out.
//!
//! This crate is the data-plane counterpart to `tidalcast-rtmp`: a publish
//! session hands every completed audio/video/AMF0-data message to a
//! [`Source`] through the [`tidalcast_rtmp::session::PublishSink`] seam, and
//! a [`Source`] fans each message out to every attached [`Consumer`],
//! transmuxing it to FLV on the way out over HTTP.

mod consumer;
mod error;
mod registry;
mod source;

pub use consumer::{AsyncWriteSink, Consumer, ConsumerLimits, FlvSink};
pub use error::{ConsumerError, RegistryError};
pub use registry::Registry;
pub use source::Source;
