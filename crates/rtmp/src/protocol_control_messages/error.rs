#[derive(Debug, thiserror::Error)]
pub enum ProtocolControlMessageError {
    #[error("chunk write error: {0}")]
    ChunkWrite(#[from] crate::chunk::ChunkWriteError),
    #[error("payload too short to contain a {0}")]
    PayloadTooShort(&'static str),
}
