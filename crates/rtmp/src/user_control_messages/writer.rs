use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::define::{self, EventMessageStreamBegin};
use super::error::EventMessagesError;
use crate::chunk::{Chunk, ChunkEncoder};
use crate::messages::MessageTypeId;

impl EventMessageStreamBegin {
    pub fn write(&self, encoder: &ChunkEncoder, writer: &mut impl io::Write) -> Result<(), EventMessagesError> {
        let mut data = Vec::with_capacity(6);
        data.write_u16::<BigEndian>(define::EventType::StreamBegin as u16).expect("vec write");
        data.write_u32::<BigEndian>(self.stream_id).expect("vec write");

        encoder.write_chunk(writer, Chunk::new(0x02, 0, MessageTypeId::UserControlEvent, 0, data.into()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};

    use super::*;
    use crate::chunk::ChunkDecoder;

    #[test]
    fn writes_stream_begin() {
        let mut buf = BytesMut::new();
        let encoder = ChunkEncoder::default();

        EventMessageStreamBegin { stream_id: 1 }
            .write(&encoder, &mut (&mut buf).writer())
            .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::UserControlEvent);
        assert_eq!(chunk.payload, Bytes::from(vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x01]));
    }
}
