/// User control event types (6.2). Only `StreamBegin` is ever written by
/// this server; `SetBufferLength` and `PingResponse` are decoded on the
/// inbound side so a client that sends them isn't silently ignored by the
/// message parser's catch-all, even though a publish-only server (no play
/// client, no server-initiated ping) has nothing useful to do with either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u16)]
pub enum EventType {
    StreamBegin = 0,
    SetBufferLength = 3,
    PingRequest = 6,
    PingResponse = 7,
}

/// Sent once a stream starts publishing, notifying the peer that `stream_id`
/// is now live.
pub struct EventMessageStreamBegin {
    pub stream_id: u32,
}

/// A decoded inbound user control event this server accepts but otherwise
/// ignores: a play client's declared playback buffer size (`SetBufferLength`,
/// 6.2.3) and a client's reply to a server-initiated keep-alive
/// (`PingResponse`, 6.2.7). Neither changes this server's behavior, since it
/// supports neither `play` nor server-initiated pings, but both are decoded
/// rather than swallowed so the session's event log reflects what the peer
/// actually sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundUserControlEvent {
    SetBufferLength { stream_id: u32, buffer_length_ms: u32 },
    PingResponse { timestamp: u32 },
}
