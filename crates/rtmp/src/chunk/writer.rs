use std::io;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::define::{Chunk, ChunkType, INIT_CHUNK_SIZE};
use super::error::ChunkWriteError;

const EXTENDED_TIMESTAMP_SENTINEL: u32 = 0xFFFFFF;

/// Splits outgoing messages into chunks no larger than the configured chunk
/// size, always starting a message with a full type 0 header and continuing
/// it, if necessary, with type 3 headers (5.3.1.1 requires continuations use
/// type 3; the basic header is all a continuation chunk carries).
pub struct ChunkEncoder {
    chunk_size: usize,
}

impl Default for ChunkEncoder {
    fn default() -> Self {
        Self {
            chunk_size: INIT_CHUNK_SIZE,
        }
    }
}

impl ChunkEncoder {
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size;
    }

    pub fn write_chunk(&self, writer: &mut impl io::Write, chunk: Chunk) -> Result<(), ChunkWriteError> {
        let Chunk {
            basic_header,
            message_header,
            payload,
        } = chunk;
        let csid = basic_header.chunk_stream_id;
        let extended = message_header.is_extended_timestamp();
        let timestamp_field = if extended {
            EXTENDED_TIMESTAMP_SENTINEL
        } else {
            message_header.timestamp
        };

        write_basic_header(writer, ChunkType::Type0, csid)?;
        write_u24_be(writer, timestamp_field)?;
        write_u24_be(writer, message_header.msg_length)?;
        writer.write_u8(message_header.msg_type_id as u8)?;
        writer.write_u32::<LittleEndian>(message_header.msg_stream_id)?;
        if extended {
            writer.write_u32::<BigEndian>(message_header.timestamp)?;
        }

        let mut offset = 0;
        let mut first = true;
        while offset < payload.len() || (payload.is_empty() && first) {
            if !first {
                write_basic_header(writer, ChunkType::Type3, csid)?;
                if extended {
                    writer.write_u32::<BigEndian>(message_header.timestamp)?;
                }
            }

            let take = (payload.len() - offset).min(self.chunk_size);
            writer.write_all(&payload[offset..offset + take])?;
            offset += take;
            first = false;
        }

        Ok(())
    }
}

fn write_basic_header(writer: &mut impl io::Write, format: ChunkType, chunk_stream_id: u32) -> io::Result<()> {
    let fmt_bits = (format as u8) << 6;

    if chunk_stream_id < 64 {
        writer.write_u8(fmt_bits | chunk_stream_id as u8)
    } else if chunk_stream_id < 64 + 256 {
        writer.write_u8(fmt_bits)?;
        writer.write_u8((chunk_stream_id - 64) as u8)
    } else {
        let id = chunk_stream_id - 64;
        writer.write_u8(fmt_bits | 0x01)?;
        writer.write_u8((id & 0xFF) as u8)?;
        writer.write_u8((id >> 8) as u8)
    }
}

fn write_u24_be(writer: &mut impl io::Write, value: u32) -> io::Result<()> {
    let bytes = value.to_be_bytes();
    writer.write_all(&bytes[1..4])
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};

    use super::*;
    use crate::chunk::reader::ChunkDecoder;
    use crate::messages::MessageTypeId;

    #[test]
    fn writes_a_full_type0_header_for_a_single_chunk_message() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();
        encoder
            .write_chunk(
                &mut (&mut buf).writer(),
                Chunk::new(3, 123, MessageTypeId::CommandAmf0, 1, Bytes::from_static(b"hi")),
            )
            .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.message_header.timestamp, 123);
        assert_eq!(chunk.message_header.msg_stream_id, 1);
        assert_eq!(chunk.payload, Bytes::from_static(b"hi"));
    }

    #[test]
    fn large_chunk_stream_ids_use_the_extended_basic_header_form() {
        let mut buf = BytesMut::new();
        write_basic_header(&mut (&mut buf).writer(), ChunkType::Type0, 500).unwrap();
        assert_eq!(buf[0] & 0x3F, 1);
    }
}
