use std::sync::Arc;

use crate::messages::DataMessage;

/// What a publishing session hands its audio/video/AMF0-data messages to
/// once a `publish` command has been accepted.
///
/// The engine crate has no notion of a "source" or "consumer" fan-out; it
/// only needs somewhere to forward completed data-plane messages and a way
/// to be told the stream is gone. The relay crate's registry implements
/// this trait so the session can stay ignorant of fan-out, back-pressure,
/// and FLV transmuxing entirely.
pub trait PublishSink: Send + Sync {
    /// Creates (or rejects) the named stream and returns a handle the
    /// session forwards every subsequent data message to.
    ///
    /// `app`/`stream` are not combined here on purpose: joining them into a
    /// registry key (`"{app}/{stream}"`) is the registry's concern.
    fn publish(&self, app: &str, stream: &str) -> Result<Arc<dyn MessageHandle>, PublishSinkError>;
}

/// A live publish in progress. One instance per `Session`, held for as long
/// as the client is in the `Publishing` state.
pub trait MessageHandle: Send + Sync {
    /// Forwards one reassembled audio/video/data message.
    fn handle_message(&self, msg: Arc<DataMessage>);

    /// Called exactly once, when the publisher disconnects or is replaced,
    /// so the sink can tear the stream down (remove it from the registry,
    /// close every attached consumer).
    fn disconnect(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum PublishSinkError {
    #[error("stream '{0}' is already being published")]
    Busy(String),
}
