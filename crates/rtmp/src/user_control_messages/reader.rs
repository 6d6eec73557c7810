use num_traits::FromPrimitive;

use super::define::{EventType, InboundUserControlEvent};
use super::error::EventMessagesError;

impl InboundUserControlEvent {
    /// Decodes a `UserControlEvent` message body. Returns `Ok(None)` for any
    /// event type this server has no use for (`StreamBegin`/`PingRequest`
    /// are server-originated only, and any other type is unrecognized).
    pub fn read(payload: &[u8]) -> Result<Option<Self>, EventMessagesError> {
        let event_type = payload
            .get(0..2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .and_then(EventType::from_u16);

        match event_type {
            Some(EventType::SetBufferLength) => {
                let stream_id = read_u32(payload, 2).ok_or(EventMessagesError::PayloadTooShort("SetBufferLength"))?;
                let buffer_length_ms = read_u32(payload, 6).ok_or(EventMessagesError::PayloadTooShort("SetBufferLength"))?;
                Ok(Some(Self::SetBufferLength { stream_id, buffer_length_ms }))
            }
            Some(EventType::PingResponse) => {
                let timestamp = read_u32(payload, 2).ok_or(EventMessagesError::PayloadTooShort("PingResponse"))?;
                Ok(Some(Self::PingResponse { timestamp }))
            }
            Some(EventType::StreamBegin) | Some(EventType::PingRequest) | None => Ok(None),
        }
    }
}

fn read_u32(payload: &[u8], offset: usize) -> Option<u32> {
    payload.get(offset..offset + 4)?.try_into().ok().map(u32::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, WriteBytesExt};

    use super::*;

    #[test]
    fn decodes_set_buffer_length() {
        let mut payload = Vec::new();
        payload.write_u16::<BigEndian>(EventType::SetBufferLength as u16).unwrap();
        payload.write_u32::<BigEndian>(1).unwrap();
        payload.write_u32::<BigEndian>(3000).unwrap();

        let event = InboundUserControlEvent::read(&payload).unwrap().unwrap();
        assert_eq!(event, InboundUserControlEvent::SetBufferLength { stream_id: 1, buffer_length_ms: 3000 });
    }

    #[test]
    fn decodes_ping_response() {
        let mut payload = Vec::new();
        payload.write_u16::<BigEndian>(EventType::PingResponse as u16).unwrap();
        payload.write_u32::<BigEndian>(42).unwrap();

        let event = InboundUserControlEvent::read(&payload).unwrap().unwrap();
        assert_eq!(event, InboundUserControlEvent::PingResponse { timestamp: 42 });
    }

    #[test]
    fn unrecognized_event_type_decodes_to_none() {
        let mut payload = Vec::new();
        payload.write_u16::<BigEndian>(EventType::StreamBegin as u16).unwrap();
        payload.write_u32::<BigEndian>(1).unwrap();

        assert!(InboundUserControlEvent::read(&payload).unwrap().is_none());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let payload = EventType::PingResponse as u16;
        let bytes = payload.to_be_bytes();
        let err = InboundUserControlEvent::read(&bytes).unwrap_err();
        assert!(matches!(err, EventMessagesError::PayloadTooShort("PingResponse")));
    }
}
