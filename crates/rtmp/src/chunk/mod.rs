mod define;
mod error;
mod reader;
mod writer;

pub use define::{
    AUDIO_CHUNK_STREAM_ID, CHUNK_SIZE, COMMAND_CHUNK_STREAM_ID, Chunk, ChunkBasicHeader, ChunkMessageHeader, ChunkType,
    INIT_CHUNK_SIZE, MAX_CHUNK_SIZE, PROTOCOL_CONTROL_CHUNK_STREAM_ID, STREAM_CHUNK_STREAM_ID, VIDEO_CHUNK_STREAM_ID,
};
pub use error::{ChunkReadError, ChunkWriteError};
pub use reader::ChunkDecoder;
pub use writer::ChunkEncoder;
