#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("stream '{0}' is already being published")]
    Busy(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("stream closed")]
    Closed,
    #[error("publisher has not sent metadata yet")]
    MetadataUnavailable,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Flv(#[from] tidalcast_flv::FlvError),
}
