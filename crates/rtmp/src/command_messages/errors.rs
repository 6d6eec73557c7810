#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("amf0 encode error: {0}")]
    Io(#[from] std::io::Error),
    #[error("chunk write error: {0}")]
    ChunkWrite(#[from] crate::chunk::ChunkWriteError),
}
