#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("amf0 error: {0}")]
    Amf0(#[from] tidalcast_amf0::Amf0Error),
    #[error("protocol control message error: {0}")]
    ProtocolControl(#[from] crate::protocol_control_messages::ProtocolControlMessageError),
    #[error("user control event error: {0}")]
    UserControlEvent(#[from] crate::user_control_messages::EventMessagesError),
}
