#[derive(Debug, thiserror::Error)]
pub enum ChunkReadError {
    #[error("chunk stream {0} sent a continuation chunk before any type 0 chunk")]
    MissingInitialChunk(u32),
    #[error("chunk stream {0} sent a type 0 chunk while a message was already in progress")]
    UnexpectedNewMessage(u32),
    #[error("peer requested a chunk size of {0}, which exceeds the maximum of {1}")]
    ChunkSizeTooLarge(usize, usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkWriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
