use bytes::Bytes;
use tidalcast_amf0::Amf0Value;

use crate::protocol_control_messages::ProtocolControlMessageSetChunkSize;
use crate::user_control_messages::InboundUserControlEvent;

/// An RTMP message decoded from a complete chunk stream message (i.e. after
/// all of its chunks have been reassembled).
#[derive(Debug)]
pub enum MessageData {
    // Protocol control messages
    SetChunkSize(ProtocolControlMessageSetChunkSize),
    // User control messages
    UserControlEvent(InboundUserControlEvent),
    // Command messages
    Amf0Command {
        command_name: Amf0Value,
        transaction_id: Amf0Value,
        command_object: Amf0Value,
        others: Vec<Amf0Value>,
    },
    Amf0Data {
        data: Bytes,
    },
    AudioData {
        data: Bytes,
    },
    VideoData {
        data: Bytes,
    },
}

/// The kind of a [`DataMessage`], i.e. a `MessageData` variant that is
/// forwarded to the data plane (a [`crate::session::PublishSink`]) instead of
/// being handled by the session state machine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMessageKind {
    Audio,
    Video,
    Amf0Data,
}

/// An audio, video, or AMF0 data message ready to be handed to a source for
/// fan-out. Unlike [`MessageData`], which borrows nothing and is only used
/// transiently during dispatch, a `DataMessage` is the thing that actually
/// gets shared (behind an `Arc`) across every attached consumer: per the
/// data model, a message is never modified once it leaves the session.
#[derive(Debug, Clone)]
pub struct DataMessage {
    pub kind: DataMessageKind,
    pub timestamp: u32,
    pub stream_id: u32,
    pub payload: Bytes,
}

/// The `msg_type_id` field of a chunk message header (5.3.1.2, table 1).
///
/// Only the message types this server actually understands are given names;
/// anything else falls through to [`crate::messages::MessageData::parse`]
/// returning `Ok(None)` and the chunk is otherwise skipped.
#[derive(Debug, PartialEq, Eq, Clone, Copy, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum MessageTypeId {
    SetChunkSize = 1,
    Abort = 2,
    Acknowledgement = 3,
    UserControlEvent = 4,
    WindowAcknowledgementSize = 5,
    SetPeerBandwidth = 6,
    Audio = 8,
    Video = 9,
    DataAmf3 = 15,
    SharedObjAmf3 = 16,
    CommandAmf3 = 17,
    DataAmf0 = 18,
    SharedObjAmf0 = 19,
    CommandAmf0 = 20,
    Aggregate = 22,
}
