use std::io::Write;

use tidalcast_amf0::Amf0Value;

use super::CommandError;
use crate::chunk::{ChunkEncoder, STREAM_CHUNK_STREAM_ID};

/// Writer for `NetStream`-scoped status events, delivered on the stream's
/// own chunk stream (preferred csid 5) rather than the connection's.
pub struct NetStream;

impl NetStream {
    /// `onStatus`, used for every `NetStream.*` lifecycle notification this
    /// server emits (`Publish.Start`, `Unpublish.Success`, ...).
    pub fn write_on_status(
        encoder: &ChunkEncoder,
        writer: &mut impl Write,
        msg_stream_id: u32,
        level: &str,
        code: &str,
        description: &str,
    ) -> Result<(), CommandError> {
        let information = Amf0Value::object([
            ("level", Amf0Value::string(level)),
            ("code", Amf0Value::string(code)),
            ("description", Amf0Value::string(description)),
        ]);

        super::write_command(
            encoder,
            writer,
            STREAM_CHUNK_STREAM_ID,
            msg_stream_id,
            &[Amf0Value::string("onStatus"), Amf0Value::Number(0.0), Amf0Value::Null, information],
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::chunk::ChunkDecoder;

    #[test]
    fn writes_publish_start_status() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();
        NetStream::write_on_status(
            &encoder,
            &mut (&mut buf).writer(),
            1,
            "status",
            "NetStream.Publish.Start",
            "live stream published",
        )
        .unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.basic_header.chunk_stream_id, STREAM_CHUNK_STREAM_ID);
        assert_eq!(chunk.message_header.msg_stream_id, 1);

        let values = tidalcast_amf0::Amf0Decoder::new(&chunk.payload).decode_all().unwrap();
        assert_eq!(values[0], Amf0Value::string("onStatus"));
        assert_eq!(
            values[3].get("code").and_then(Amf0Value::as_str),
            Some("NetStream.Publish.Start")
        );
    }
}
