#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("client requested unsupported rtmp version {0:#x}, expected 0x03")]
    UnsupportedVersion(u8),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
