use crate::chunk::{ChunkReadError, ChunkWriteError};
use crate::command_messages::CommandError;
use crate::handshake::HandshakeError;
use crate::messages::MessageError;
use crate::protocol_control_messages::ProtocolControlMessageError;
use crate::session::sink::PublishSinkError;
use crate::user_control_messages::EventMessagesError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("chunk read error: {0}")]
    ChunkRead(#[from] ChunkReadError),
    #[error("chunk write error: {0}")]
    ChunkWrite(#[from] ChunkWriteError),
    #[error("message error: {0}")]
    Message(#[from] MessageError),
    #[error("protocol control message error: {0}")]
    ProtocolControl(#[from] ProtocolControlMessageError),
    #[error("user control event error: {0}")]
    UserControlEvent(#[from] EventMessagesError),
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("publisher timed out")]
    Timeout,
    #[error("publish rejected: {0}")]
    PublishDenied(#[from] PublishSinkError),
    #[error("connect command carried no app name")]
    NoAppName,
    #[error("publish command carried no stream name")]
    NoStreamName,
    #[error("play is not a supported client mode")]
    PlayNotSupported,
    #[error("referenced an unknown stream id {0}")]
    UnknownStreamId(u32),
    #[error("inbound channel closed")]
    InboundClosed,
    #[error("peer requested an invalid chunk size {0}")]
    InvalidChunkSize(usize),
    #[error("publish command received outside the stream-ready state")]
    PublishNotReady,
}

impl SessionError {
    /// True for conditions that are a routine disconnect rather than a
    /// logged failure: EOF on read, or the inbound pump simply stopping
    /// because the peer went away (7, "Transport" / "EOF is silent").
    pub fn is_client_closed(&self) -> bool {
        match self {
            SessionError::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            SessionError::InboundClosed => true,
            SessionError::ChunkRead(ChunkReadError::Io(err)) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
