use std::io::Write;

use tidalcast_amf0::Amf0Value;

use super::CommandError;
use crate::chunk::{ChunkEncoder, COMMAND_CHUNK_STREAM_ID};

/// Writers for the `NetConnection`-scoped replies a publishing session sends:
/// the `connect` result, `onBWDone`, and the `createStream` result. All of
/// these ride chunk stream 3 and message stream id 0 (5.3.1, 7.1.1).
pub struct NetConnection;

impl NetConnection {
    /// `_result` for `connect`, reporting `NetConnection.Connect.Success`.
    pub fn write_connect_result(
        encoder: &ChunkEncoder,
        writer: &mut impl Write,
        transaction_id: f64,
    ) -> Result<(), CommandError> {
        let properties = Amf0Value::object([
            ("fmsVer", Amf0Value::string("FMS/3,0,1,123")),
            ("capabilities", Amf0Value::Number(31.0)),
        ]);
        let information = Amf0Value::object([
            ("level", Amf0Value::string("status")),
            ("code", Amf0Value::string("NetConnection.Connect.Success")),
            ("description", Amf0Value::string("Connection succeeded.")),
            ("objectEncoding", Amf0Value::Number(0.0)),
        ]);

        super::write_command(
            encoder,
            writer,
            COMMAND_CHUNK_STREAM_ID,
            0,
            &[
                Amf0Value::string("_result"),
                Amf0Value::Number(transaction_id),
                properties,
                information,
            ],
        )
    }

    /// `onBWDone`, sent right after the `connect` result per the FMLE
    /// handshake sequence most publishers expect before issuing
    /// `releaseStream`/`FCPublish`.
    pub fn write_on_bw_done(encoder: &ChunkEncoder, writer: &mut impl Write) -> Result<(), CommandError> {
        super::write_command(
            encoder,
            writer,
            COMMAND_CHUNK_STREAM_ID,
            0,
            &[Amf0Value::string("onBWDone"), Amf0Value::Number(0.0), Amf0Value::Null],
        )
    }

    /// A bare `_result` acknowledging `releaseStream` or `FCPublish`, whose
    /// bodies nobody inspects but whose presence FMLE-style publishers wait
    /// on before proceeding.
    pub fn write_result_ack(encoder: &ChunkEncoder, writer: &mut impl Write, transaction_id: f64) -> Result<(), CommandError> {
        super::write_command(
            encoder,
            writer,
            COMMAND_CHUNK_STREAM_ID,
            0,
            &[
                Amf0Value::string("_result"),
                Amf0Value::Number(transaction_id),
                Amf0Value::Null,
                Amf0Value::Undefined,
            ],
        )
    }

    /// `onFCPublish`, the extra FMLE-compatibility notice several media
    /// servers send alongside the `FCPublish` `_result`.
    pub fn write_on_fc_publish(encoder: &ChunkEncoder, writer: &mut impl Write) -> Result<(), CommandError> {
        let information = Amf0Value::object([
            ("code", Amf0Value::string("NetStream.Publish.Start")),
            ("description", Amf0Value::string("FCPublish acknowledged.")),
        ]);

        super::write_command(
            encoder,
            writer,
            COMMAND_CHUNK_STREAM_ID,
            0,
            &[Amf0Value::string("onFCPublish"), Amf0Value::Number(0.0), Amf0Value::Null, information],
        )
    }

    /// `_result` for `createStream`, reporting the single stream id this
    /// server ever hands out (1.0), per 7.2.1.3.
    pub fn write_create_stream_result(
        encoder: &ChunkEncoder,
        writer: &mut impl Write,
        transaction_id: f64,
        stream_id: f64,
    ) -> Result<(), CommandError> {
        super::write_command(
            encoder,
            writer,
            COMMAND_CHUNK_STREAM_ID,
            0,
            &[
                Amf0Value::string("_result"),
                Amf0Value::Number(transaction_id),
                Amf0Value::Null,
                Amf0Value::Number(stream_id),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::chunk::ChunkDecoder;
    use crate::messages::MessageTypeId;

    #[test]
    fn writes_connect_result_on_command_chunk_stream() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();
        NetConnection::write_connect_result(&encoder, &mut (&mut buf).writer(), 1.0).unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.basic_header.chunk_stream_id, COMMAND_CHUNK_STREAM_ID);
        assert_eq!(chunk.message_header.msg_type_id, MessageTypeId::CommandAmf0);

        let values = tidalcast_amf0::Amf0Decoder::new(&chunk.payload).decode_all().unwrap();
        assert_eq!(values[0], Amf0Value::string("_result"));
        assert_eq!(values[1], Amf0Value::Number(1.0));
        assert_eq!(
            values[3].get("code").and_then(Amf0Value::as_str),
            Some("NetConnection.Connect.Success")
        );
    }

    #[test]
    fn writes_create_stream_result_with_stream_id() {
        let encoder = ChunkEncoder::default();
        let mut buf = BytesMut::new();
        NetConnection::write_create_stream_result(&encoder, &mut (&mut buf).writer(), 4.0, 1.0).unwrap();

        let mut decoder = ChunkDecoder::default();
        let chunk = decoder.read_chunk(&mut buf).unwrap().unwrap();
        let values = tidalcast_amf0::Amf0Decoder::new(&chunk.payload).decode_all().unwrap();
        assert_eq!(values[1], Amf0Value::Number(4.0));
        assert_eq!(values[3], Amf0Value::Number(1.0));
    }
}
