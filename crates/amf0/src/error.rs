use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Amf0Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unknown marker byte: {0:#x}")]
    UnknownMarker(u8),
    #[error("unsupported marker: {0:?}")]
    UnsupportedType(crate::Amf0Marker),
    #[error("string is not valid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("object is missing its terminating end marker")]
    UnexpectedEof,
}
