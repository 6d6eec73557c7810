//! Server-originated AMF0 command messages (7.1, 7.2): `connect`/`createStream`
//! responses on the connection's own chunk stream, and `onStatus` on the
//! per-stream one. Each writer composes its exact AMF0 body ahead of time and
//! hands it to the [`ChunkEncoder`] as a single `CommandAmf0` message.

mod errors;
mod netconnection;
mod netstream;

use std::io::Write;

use bytes::Bytes;
pub use errors::CommandError;
pub use netconnection::NetConnection;
pub use netstream::NetStream;
use tidalcast_amf0::{Amf0Encoder, Amf0Value};

use crate::chunk::{Chunk, ChunkEncoder};
use crate::messages::MessageTypeId;

fn write_command(
    encoder: &ChunkEncoder,
    writer: &mut impl Write,
    chunk_stream_id: u32,
    msg_stream_id: u32,
    values: &[Amf0Value],
) -> Result<(), CommandError> {
    let mut buf = Vec::new();
    Amf0Encoder::encode_all(&mut buf, values)?;
    encoder.write_chunk(
        writer,
        Chunk::new(chunk_stream_id, 0, MessageTypeId::CommandAmf0, msg_stream_id, Bytes::from(buf)),
    )?;
    Ok(())
}
