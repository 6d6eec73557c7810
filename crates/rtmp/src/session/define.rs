use crate::messages::MessageData;
use crate::protocol_control_messages::ProtocolControlMessageSetPeerBandwidthLimitType;

/// The window size this server advertises to the client via
/// `WindowAcknowledgementSize`/`SetPeerBandwidth` on `connect`, and the
/// threshold it holds itself to when deciding to send an `Acknowledgement`
/// back (4.3.6). Publish clients essentially never send their own
/// `WindowAcknowledgementSize`, so this server does not track a
/// client-supplied override.
pub const DEFAULT_WINDOW_ACK_SIZE: u32 = 2_500_000;

/// One reassembled RTMP message, still carrying the stream id and timestamp
/// it arrived with (both stripped off by the time it becomes a
/// [`MessageData`]) for handlers that need them (`publish`'s stream id,
/// `onMetaData`'s timestamp-zero check).
pub struct InboundMessage {
    pub data: MessageData,
    pub stream_id: u32,
    pub timestamp: u32,
}

/// A server-originated reply queued for the sender task. Carrying the
/// request parameters rather than pre-encoded bytes lets the sender own the
/// single [`crate::chunk::ChunkEncoder`] instance (and thus its chunk-size
/// state) for every outbound write (4.3.5).
pub enum OutboundMessage {
    SetChunkSize(u32),
    WindowAckSize(u32),
    SetPeerBandwidth(u32, ProtocolControlMessageSetPeerBandwidthLimitType),
    Acknowledgement(u32),
    ConnectResult { transaction_id: f64 },
    OnBwDone,
    ResultAck { transaction_id: f64 },
    OnFcPublish,
    CreateStreamResult { transaction_id: f64, stream_id: f64 },
    StreamBegin { stream_id: u32 },
    OnStatus {
        msg_stream_id: u32,
        level: &'static str,
        code: &'static str,
        description: String,
    },
}

/// The publisher session state machine (4.3.3). Only the states a publish
/// client actually passes through are modeled; a `play` client is rejected
/// the moment it's identified rather than given a state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake complete, `connect` not yet received.
    Connecting,
    /// `connect` acknowledged; waiting for `releaseStream`/`FCPublish`/`createStream`.
    Connected,
    /// `createStream` acknowledged; waiting for `publish`.
    StreamReady,
    /// `publish` acknowledged; audio/video/data messages are forwarded to the sink.
    Publishing,
    /// Session is ending (clean unpublish or fatal error already logged).
    Terminal,
}

/// The command names this server recognizes on an inbound `CommandAmf0`
/// message. Closed set: the session `match`es over this rather than doing
/// any dynamic command dispatch (9, "Dynamic dispatch on inbound packets").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtmpCommand {
    Connect,
    ReleaseStream,
    FcPublish,
    CreateStream,
    Publish,
    FcUnpublish,
    DeleteStream,
    Call,
    Close,
    Play,
    Unknown(String),
}

impl From<&str> for RtmpCommand {
    fn from(name: &str) -> Self {
        match name {
            "connect" => Self::Connect,
            "releaseStream" => Self::ReleaseStream,
            "FCPublish" => Self::FcPublish,
            "createStream" => Self::CreateStream,
            "publish" => Self::Publish,
            "FCUnpublish" => Self::FcUnpublish,
            "deleteStream" => Self::DeleteStream,
            "call" => Self::Call,
            "close" => Self::Close,
            "play" => Self::Play,
            other => Self::Unknown(other.to_owned()),
        }
    }
}
