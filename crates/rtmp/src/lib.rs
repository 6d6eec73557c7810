//! A pure Rust RTMP 1.0 server protocol engine.
//!
//! This crate speaks just enough of RTMP to accept a single publishing
//! client per connection: handshake, chunk (de)framing, AMF0 command
//! dispatch, and the publish session state machine. It has no notion of a
//! stream registry, fan-out, or remuxing; [`session::PublishSink`] is the
//! seam a relay implementation plugs into.
//!
//! Playback (`play`) is intentionally unsupported: a client that issues it
//! is rejected rather than served, since this server's only output path is
//! HTTP-FLV built on top of the relay crate, not RTMP playback.

pub mod chunk;
pub mod command_messages;
pub mod handshake;
pub mod messages;
pub mod protocol_control_messages;
pub mod session;
pub mod user_control_messages;

pub use messages::{DataMessage, DataMessageKind};
pub use session::{MessageHandle, PublishSink, PublishSinkError, Session, SessionError};
