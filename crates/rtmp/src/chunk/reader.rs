use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_traits::FromPrimitive;

use super::define::{Chunk, ChunkBasicHeader, ChunkMessageHeader, ChunkType, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use super::error::ChunkReadError;
use crate::messages::MessageTypeId;

/// Timestamp (or timestamp delta) field values at or above this sentinel
/// mean the real 32-bit value follows in an extended timestamp field
/// (5.3.1.3).
const EXTENDED_TIMESTAMP_SENTINEL: u32 = 0xFFFFFF;

/// Per-`chunk_stream_id` state needed to interpret type 1/2/3 chunk headers,
/// which omit fields that must be inherited from the stream's last chunk.
struct ChunkStreamState {
    msg_stream_id: u32,
    msg_type_id: MessageTypeId,
    msg_length: u32,
    timestamp: u32,
    timestamp_delta: u32,
    extended: bool,
    partial: Option<PartialMessage>,
}

struct PartialMessage {
    header: ChunkMessageHeader,
    payload: BytesMut,
}

/// Reassembles RTMP chunks read off the wire into complete messages.
///
/// Chunks for unrelated chunk streams can interleave on the same socket, so
/// state is tracked per `chunk_stream_id`. [`ChunkDecoder::read_chunk`] may
/// need to consume several chunks before a message completes; it returns
/// `Ok(None)` both when the buffer is starved for more socket data and when
/// it consumed a chunk that didn't complete a message, so callers should
/// just keep calling it in a loop after each socket read.
pub struct ChunkDecoder {
    streams: HashMap<u32, ChunkStreamState>,
    max_chunk_size: usize,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self {
            streams: HashMap::new(),
            max_chunk_size: super::define::INIT_CHUNK_SIZE,
        }
    }
}

impl ChunkDecoder {
    /// Applies a peer-requested `SetChunkSize`. Returns `false` (and leaves
    /// the chunk size unchanged) if the requested size is unreasonable.
    pub fn update_max_chunk_size(&mut self, size: usize) -> bool {
        if size < MIN_CHUNK_SIZE || size > MAX_CHUNK_SIZE {
            return false;
        }
        self.max_chunk_size = size;
        true
    }

    /// Attempts to read one complete message, consuming as many chunks from
    /// `buf` as necessary. Returns `Ok(None)` if `buf` doesn't yet hold a
    /// full message (more socket data is needed).
    pub fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<Option<Chunk>, ChunkReadError> {
        loop {
            match self.try_read_one(buf)? {
                None => return Ok(None),
                Some(None) => continue,
                Some(Some(chunk)) => return Ok(Some(chunk)),
            }
        }
    }

    fn try_read_one(&mut self, buf: &mut BytesMut) -> Result<Option<Option<Chunk>>, ChunkReadError> {
        let Some((format, chunk_stream_id, bh_len)) = read_basic_header(buf) else {
            return Ok(None);
        };

        let mh_len = message_header_len(format);
        if buf.len() < bh_len + mh_len {
            return Ok(None);
        }

        let fields = read_message_header_fields(&buf[bh_len..bh_len + mh_len], format);

        let is_new_stream = !self.streams.contains_key(&chunk_stream_id);
        if is_new_stream && format != ChunkType::Type0 {
            return Err(ChunkReadError::MissingInitialChunk(chunk_stream_id));
        }
        if is_new_stream {
            self.streams.insert(
                chunk_stream_id,
                ChunkStreamState {
                    msg_stream_id: 0,
                    msg_type_id: MessageTypeId::Aggregate,
                    msg_length: 0,
                    timestamp: 0,
                    timestamp_delta: 0,
                    extended: false,
                    partial: None,
                },
            );
        }
        let state = self.streams.get(&chunk_stream_id).expect("just inserted");

        if format == ChunkType::Type0 && state.partial.is_some() {
            return Err(ChunkReadError::UnexpectedNewMessage(chunk_stream_id));
        }

        // Determine whether an extended-timestamp field follows the header, and
        // whether format 3's tentative read of it needs to be treated as payload
        // instead (the FMLE repeated-header quirk).
        let raw_ts = fields.timestamp_or_delta;
        let tentatively_extended = match format {
            ChunkType::Type0 | ChunkType::Type1 | ChunkType::Type2 => raw_ts >= EXTENDED_TIMESTAMP_SENTINEL,
            ChunkType::Type3 => state.extended,
        };

        let ext_len = if tentatively_extended { 4 } else { 0 };
        if buf.len() < bh_len + mh_len + ext_len {
            return Ok(None);
        }

        let mut ext_ts = 0u32;
        let mut ext_len = ext_len;
        if tentatively_extended {
            ext_ts = u32::from_be_bytes(buf[bh_len + mh_len..bh_len + mh_len + 4].try_into().unwrap());

            if format == ChunkType::Type3 {
                // Continuing an in-progress message must repeat the same extended
                // timestamp; if it doesn't, these 4 bytes are payload, not a header
                // field, and the encoder simply omitted the repeat.
                if let Some(partial) = &state.partial {
                    if partial.header.timestamp != ext_ts {
                        ext_len = 0;
                    }
                }
            }
        }

        let header_len = bh_len + mh_len + ext_len;

        // Resolve this chunk's message header from the wire fields plus
        // inherited state.
        let state = self.streams.get(&chunk_stream_id).expect("present");
        let resolved_timestamp_field = if ext_len == 4 { ext_ts } else { raw_ts };

        let (msg_stream_id, msg_type_id, msg_length, timestamp, timestamp_delta) = match format {
            ChunkType::Type0 => (
                fields.msg_stream_id.unwrap(),
                fields.msg_type_id.unwrap(),
                fields.msg_length.unwrap(),
                resolved_timestamp_field,
                0,
            ),
            ChunkType::Type1 => (
                state.msg_stream_id,
                fields.msg_type_id.unwrap(),
                fields.msg_length.unwrap(),
                state.timestamp.wrapping_add(resolved_timestamp_field),
                resolved_timestamp_field,
            ),
            ChunkType::Type2 => (
                state.msg_stream_id,
                state.msg_type_id,
                state.msg_length,
                state.timestamp.wrapping_add(resolved_timestamp_field),
                resolved_timestamp_field,
            ),
            ChunkType::Type3 => {
                if let Some(partial) = &state.partial {
                    (
                        partial.header.msg_stream_id,
                        partial.header.msg_type_id,
                        partial.header.msg_length,
                        partial.header.timestamp,
                        state.timestamp_delta,
                    )
                } else {
                    // A fresh message started with a type 3 header inherits the
                    // previous message's delta (FMLE compatibility, 5.3.1.1.4).
                    (
                        state.msg_stream_id,
                        state.msg_type_id,
                        state.msg_length,
                        state.timestamp.wrapping_add(state.timestamp_delta),
                        state.timestamp_delta,
                    )
                }
            }
        };

        let payload_remaining = if let Some(partial) = &state.partial {
            msg_length as usize - partial.payload.len()
        } else {
            msg_length as usize
        };
        let payload_len = payload_remaining.min(self.max_chunk_size);

        if buf.len() < header_len + payload_len {
            return Ok(None);
        }

        let payload_chunk = Bytes::copy_from_slice(&buf[header_len..header_len + payload_len]);
        buf.advance(header_len + payload_len);

        let message_header = ChunkMessageHeader {
            timestamp,
            msg_length,
            msg_type_id,
            msg_stream_id,
            was_extended_timestamp: ext_len == 4,
        };

        let state = self.streams.get_mut(&chunk_stream_id).expect("present");
        state.msg_stream_id = msg_stream_id;
        state.msg_type_id = msg_type_id;
        state.msg_length = msg_length;
        state.timestamp = timestamp;
        state.timestamp_delta = timestamp_delta;
        state.extended = ext_len == 4;

        let partial = state.partial.get_or_insert_with(|| PartialMessage {
            header: message_header.clone(),
            payload: BytesMut::with_capacity(msg_length as usize),
        });
        partial.payload.extend_from_slice(&payload_chunk);

        if partial.payload.len() as u32 >= msg_length {
            let completed = state.partial.take().expect("just checked");
            return Ok(Some(Some(Chunk {
                basic_header: ChunkBasicHeader {
                    format,
                    chunk_stream_id,
                },
                message_header: completed.header,
                payload: completed.payload.freeze(),
            })));
        }

        Ok(Some(None))
    }
}

struct MessageHeaderFields {
    timestamp_or_delta: u32,
    msg_length: Option<u32>,
    msg_type_id: Option<MessageTypeId>,
    msg_stream_id: Option<u32>,
}

fn message_header_len(format: ChunkType) -> usize {
    match format {
        ChunkType::Type0 => 11,
        ChunkType::Type1 => 7,
        ChunkType::Type2 => 3,
        ChunkType::Type3 => 0,
    }
}

fn read_message_header_fields(bytes: &[u8], format: ChunkType) -> MessageHeaderFields {
    match format {
        ChunkType::Type0 => {
            let timestamp = u24_be(&bytes[0..3]);
            let msg_length = u24_be(&bytes[3..6]);
            let msg_type_id = MessageTypeId::from_u8(bytes[6]).unwrap_or(MessageTypeId::Aggregate);
            let msg_stream_id = u32::from_le_bytes(bytes[7..11].try_into().unwrap());
            MessageHeaderFields {
                timestamp_or_delta: timestamp,
                msg_length: Some(msg_length),
                msg_type_id: Some(msg_type_id),
                msg_stream_id: Some(msg_stream_id),
            }
        }
        ChunkType::Type1 => {
            let delta = u24_be(&bytes[0..3]);
            let msg_length = u24_be(&bytes[3..6]);
            let msg_type_id = MessageTypeId::from_u8(bytes[6]).unwrap_or(MessageTypeId::Aggregate);
            MessageHeaderFields {
                timestamp_or_delta: delta,
                msg_length: Some(msg_length),
                msg_type_id: Some(msg_type_id),
                msg_stream_id: None,
            }
        }
        ChunkType::Type2 => {
            let delta = u24_be(&bytes[0..3]);
            MessageHeaderFields {
                timestamp_or_delta: delta,
                msg_length: None,
                msg_type_id: None,
                msg_stream_id: None,
            }
        }
        ChunkType::Type3 => MessageHeaderFields {
            timestamp_or_delta: 0,
            msg_length: None,
            msg_type_id: None,
            msg_stream_id: None,
        },
    }
}

fn u24_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Parses the basic header (5.3.1.1): format in the top 2 bits, then one of
/// three chunk-stream-id encodings in the remaining 6.
fn read_basic_header(buf: &[u8]) -> Option<(ChunkType, u32, usize)> {
    let byte0 = *buf.first()?;
    let format = ChunkType::from_u8((byte0 >> 6) & 0x03)?;

    match byte0 & 0x3F {
        0 => {
            let byte1 = *buf.get(1)?;
            Some((format, 64 + byte1 as u32, 2))
        }
        1 => {
            let byte1 = *buf.get(1)?;
            let byte2 = *buf.get(2)?;
            Some((format, 64 + byte1 as u32 + byte2 as u32 * 256, 3))
        }
        csid => Some((format, csid as u32, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::writer::ChunkEncoder;

    #[test]
    fn round_trips_a_single_chunk_message() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();
        let chunk = Chunk::new(3, 0, MessageTypeId::CommandAmf0, 0, Bytes::from_static(b"hello"));
        encoder.write_chunk(&mut (&mut buf).writer(), chunk.clone()).unwrap();

        let mut decoder = ChunkDecoder::default();
        let decoded = decoder.read_chunk(&mut buf).unwrap().unwrap();

        assert_eq!(decoded.message_header.msg_type_id, MessageTypeId::CommandAmf0);
        assert_eq!(decoded.payload, Bytes::from_static(b"hello"));
        assert!(buf.is_empty());
    }

    #[test]
    fn splits_large_payload_across_multiple_chunks_of_max_chunk_size() {
        let mut encoder = ChunkEncoder::default();
        encoder.set_chunk_size(128);
        let payload = Bytes::from(vec![0x42; 300]);
        let chunk = Chunk::new(4, 0, MessageTypeId::Video, 1, payload.clone());

        let mut buf = BytesMut::new();
        encoder.write_chunk(&mut (&mut buf).writer(), chunk).unwrap();

        let mut decoder = ChunkDecoder::default();
        let decoded = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn first_chunk_on_a_stream_must_be_type0() {
        // A type-3 basic header (0xC0) on a never-before-seen chunk stream id.
        let mut buf = BytesMut::from(&[0xC3u8][..]);
        let mut decoder = ChunkDecoder::default();
        let err = decoder.read_chunk(&mut buf).unwrap_err();
        assert!(matches!(err, ChunkReadError::MissingInitialChunk(3)));
    }

    #[test]
    fn set_chunk_size_is_clamped_to_128_65536() {
        let mut decoder = ChunkDecoder::default();
        assert!(!decoder.update_max_chunk_size(0));
        assert!(!decoder.update_max_chunk_size(127));
        assert!(decoder.update_max_chunk_size(128));
        assert!(decoder.update_max_chunk_size(MAX_CHUNK_SIZE));
        assert!(!decoder.update_max_chunk_size(MAX_CHUNK_SIZE + 1));
    }
}
