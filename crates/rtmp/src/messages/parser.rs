use tidalcast_amf0::{Amf0Decoder, Amf0Value};

use super::define::{MessageData, MessageTypeId};
use super::error::MessageError;
use crate::chunk::Chunk;
use crate::protocol_control_messages::ProtocolControlMessageSetChunkSize;
use crate::user_control_messages::InboundUserControlEvent;

impl MessageData {
    pub fn parse(chunk: &Chunk) -> Result<Option<MessageData>, MessageError> {
        match chunk.message_header.msg_type_id {
            MessageTypeId::SetChunkSize => {
                let data = ProtocolControlMessageSetChunkSize::read(&chunk.payload)?;
                Ok(Some(MessageData::SetChunkSize(data)))
            }
            MessageTypeId::UserControlEvent => Ok(InboundUserControlEvent::read(&chunk.payload)?.map(MessageData::UserControlEvent)),
            MessageTypeId::CommandAmf0 => {
                let mut decoder = Amf0Decoder::new(&chunk.payload);

                let command_name = decoder.decode_next()?.unwrap_or(Amf0Value::Undefined);
                let transaction_id = decoder.decode_next()?.unwrap_or(Amf0Value::Number(0.0));
                let command_object = decoder.decode_next()?.unwrap_or(Amf0Value::Null);
                let others = decoder.decode_all()?;

                Ok(Some(MessageData::Amf0Command {
                    command_name,
                    transaction_id,
                    command_object,
                    others,
                }))
            }
            MessageTypeId::DataAmf0 => Ok(Some(MessageData::Amf0Data {
                data: chunk.payload.clone(),
            })),
            MessageTypeId::Audio => Ok(Some(MessageData::AudioData {
                data: chunk.payload.clone(),
            })),
            MessageTypeId::Video => Ok(Some(MessageData::VideoData {
                data: chunk.payload.clone(),
            })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tidalcast_amf0::Amf0Encoder;

    use super::*;
    use crate::chunk::Chunk;

    #[test]
    fn parses_command_message() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_all(
            &mut buf,
            &[Amf0Value::string("connect"), Amf0Value::Number(1.0), Amf0Value::Null],
        )
        .unwrap();

        let chunk = Chunk::new(0, 0, MessageTypeId::CommandAmf0, 0, Bytes::from(buf));
        let message = MessageData::parse(&chunk).unwrap().unwrap();

        match message {
            MessageData::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                others,
            } => {
                assert_eq!(command_name, Amf0Value::string("connect"));
                assert_eq!(transaction_id, Amf0Value::Number(1.0));
                assert_eq!(command_object, Amf0Value::Null);
                assert!(others.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn parses_audio_and_video_as_opaque_payloads() {
        let chunk = Chunk::new(0, 0, MessageTypeId::Audio, 0, Bytes::from_static(&[0xAF, 0x01]));
        match MessageData::parse(&chunk).unwrap().unwrap() {
            MessageData::AudioData { data } => assert_eq!(data, Bytes::from_static(&[0xAF, 0x01])),
            other => panic!("unexpected message: {other:?}"),
        }

        let chunk = Chunk::new(0, 0, MessageTypeId::Video, 0, Bytes::from_static(&[0x17, 0x01]));
        match MessageData::parse(&chunk).unwrap().unwrap() {
            MessageData::VideoData { data } => assert_eq!(data, Bytes::from_static(&[0x17, 0x01])),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn parses_set_chunk_size() {
        let chunk = Chunk::new(0, 0, MessageTypeId::SetChunkSize, 0, Bytes::from_static(&[0x00, 0xFF, 0xFF, 0xFF]));
        match MessageData::parse(&chunk).unwrap().unwrap() {
            MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                assert_eq!(chunk_size, 0x00FF_FFFF);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn parses_set_buffer_length_user_control_event() {
        use byteorder::{BigEndian, WriteBytesExt};

        use crate::user_control_messages::EventType;

        let mut payload = Vec::new();
        payload.write_u16::<BigEndian>(EventType::SetBufferLength as u16).unwrap();
        payload.write_u32::<BigEndian>(1).unwrap();
        payload.write_u32::<BigEndian>(3000).unwrap();

        let chunk = Chunk::new(0, 0, MessageTypeId::UserControlEvent, 0, Bytes::from(payload));
        match MessageData::parse(&chunk).unwrap().unwrap() {
            MessageData::UserControlEvent(InboundUserControlEvent::SetBufferLength { stream_id, buffer_length_ms }) => {
                assert_eq!(stream_id, 1);
                assert_eq!(buffer_length_ms, 3000);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unsupported_message_types_are_skipped() {
        let chunk = Chunk::new(0, 0, MessageTypeId::Aggregate, 0, Bytes::from_static(&[0x00]));
        assert!(MessageData::parse(&chunk).unwrap().is_none());
    }
}
