#[derive(Debug, thiserror::Error)]
pub enum FlvError {
    #[error("amf0 error: {0}")]
    Amf0(#[from] tidalcast_amf0::Amf0Error),
    #[error("tag data size {0} does not fit in 24 bits")]
    DataTooLarge(usize),
}
