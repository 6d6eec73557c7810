use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ByteReadError {
    #[error("connection closed while reading")]
    Eof,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
