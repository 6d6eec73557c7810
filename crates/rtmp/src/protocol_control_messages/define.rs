/// `SetChunkSize` (5.4.1): the maximum chunk payload size the sender will use
/// from now on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolControlMessageSetChunkSize {
    pub chunk_size: u32,
}

/// `WindowAcknowledgementSize` (5.4.4): how many bytes the peer should read
/// before sending an `Acknowledgement` back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolControlMessageWindowAcknowledgementSize {
    pub acknowledgement_window_size: u32,
}

/// `Acknowledgement` (5.4.3): reports the total number of bytes received so
/// far, sent once that count crosses the peer's declared window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolControlMessageAcknowledgement {
    pub sequence_number: u32,
}

/// `SetPeerBandwidth` (5.4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolControlMessageSetPeerBandwidth {
    pub acknowledgement_window_size: u32,
    pub limit_type: ProtocolControlMessageSetPeerBandwidthLimitType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum ProtocolControlMessageSetPeerBandwidthLimitType {
    Hard = 0,
    Soft = 1,
    Dynamic = 2,
}
