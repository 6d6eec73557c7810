use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;

use super::define::{
    ProtocolControlMessageAcknowledgement, ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageWindowAcknowledgementSize,
};
use super::error::ProtocolControlMessageError;
use crate::chunk::{Chunk, ChunkEncoder, PROTOCOL_CONTROL_CHUNK_STREAM_ID};
use crate::messages::MessageTypeId;

impl ProtocolControlMessageSetChunkSize {
    pub fn write(&self, encoder: &ChunkEncoder, writer: &mut impl io::Write) -> Result<(), ProtocolControlMessageError> {
        // The spec reserves the high bit.
        let chunk_size = self.chunk_size & 0x7FFF_FFFF;

        encoder.write_chunk(
            writer,
            Chunk::new(
                PROTOCOL_CONTROL_CHUNK_STREAM_ID,
                0,
                MessageTypeId::SetChunkSize,
                0,
                Bytes::from(chunk_size.to_be_bytes().to_vec()),
            ),
        )?;

        Ok(())
    }

    pub fn read(payload: &[u8]) -> Result<Self, ProtocolControlMessageError> {
        let bytes: [u8; 4] = payload
            .get(0..4)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolControlMessageError::PayloadTooShort("SetChunkSize"))?;

        Ok(Self {
            chunk_size: u32::from_be_bytes(bytes) & 0x7FFF_FFFF,
        })
    }
}

impl ProtocolControlMessageWindowAcknowledgementSize {
    pub fn write(&self, encoder: &ChunkEncoder, writer: &mut impl io::Write) -> Result<(), ProtocolControlMessageError> {
        encoder.write_chunk(
            writer,
            Chunk::new(
                PROTOCOL_CONTROL_CHUNK_STREAM_ID,
                0,
                MessageTypeId::WindowAcknowledgementSize,
                0,
                Bytes::from(self.acknowledgement_window_size.to_be_bytes().to_vec()),
            ),
        )?;

        Ok(())
    }
}

impl ProtocolControlMessageAcknowledgement {
    pub fn write(&self, encoder: &ChunkEncoder, writer: &mut impl io::Write) -> Result<(), ProtocolControlMessageError> {
        encoder.write_chunk(
            writer,
            Chunk::new(
                PROTOCOL_CONTROL_CHUNK_STREAM_ID,
                0,
                MessageTypeId::Acknowledgement,
                0,
                Bytes::from(self.sequence_number.to_be_bytes().to_vec()),
            ),
        )?;

        Ok(())
    }
}

impl ProtocolControlMessageSetPeerBandwidth {
    pub fn write(&self, encoder: &ChunkEncoder, writer: &mut impl io::Write) -> Result<(), ProtocolControlMessageError> {
        let mut data = Vec::with_capacity(5);
        data.write_u32::<BigEndian>(self.acknowledgement_window_size).expect("vec write");
        data.write_u8(self.limit_type as u8).expect("vec write");

        encoder.write_chunk(
            writer,
            Chunk::new(
                PROTOCOL_CONTROL_CHUNK_STREAM_ID,
                0,
                MessageTypeId::SetPeerBandwidth,
                0,
                Bytes::from(data),
            ),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::chunk::ChunkDecoder;
    use crate::protocol_control_messages::define::ProtocolControlMessageSetPeerBandwidthLimitType;

    #[test]
    fn writes_and_reads_back_set_chunk_size() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();

        ProtocolControlMessageSetChunkSize { chunk_size: 4096 }
            .write(&encoder, &mut (&mut buf).writer())
            .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.basic_header.chunk_stream_id, 0x02);
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::SetChunkSize);

        let decoded = ProtocolControlMessageSetChunkSize::read(&chunk.payload).unwrap();
        assert_eq!(decoded.chunk_size, 4096);
    }

    #[test]
    fn writes_window_acknowledgement_size() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();

        ProtocolControlMessageWindowAcknowledgementSize {
            acknowledgement_window_size: 1,
        }
        .write(&encoder, &mut (&mut buf).writer())
        .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::WindowAcknowledgementSize);
        assert_eq!(chunk.payload, vec![0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn writes_acknowledgement() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();

        ProtocolControlMessageAcknowledgement { sequence_number: 0x0102_0304 }
            .write(&encoder, &mut (&mut buf).writer())
            .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::Acknowledgement);
        assert_eq!(chunk.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn writes_set_peer_bandwidth() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();

        ProtocolControlMessageSetPeerBandwidth {
            acknowledgement_window_size: 1,
            limit_type: ProtocolControlMessageSetPeerBandwidthLimitType::Dynamic,
        }
        .write(&encoder, &mut (&mut buf).writer())
        .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::SetPeerBandwidth);
        assert_eq!(chunk.payload, vec![0x00, 0x00, 0x00, 0x01, 0x02]);
    }
}
