//! A pure-Rust implementation of an AMF0 encoder and decoder.
//!
//! AMF0 is the loosely-typed value encoding RTMP uses for command messages
//! and metadata (`onMetaData`). See the [Adobe AMF0 specification][spec].
//!
//! [spec]: https://rtmp.veriskope.com/pdf/amf0-file-format-specification.pdf

mod decoder;
mod encoder;
mod error;
mod marker;
mod value;

pub use decoder::Amf0Decoder;
pub use encoder::Amf0Encoder;
pub use error::Amf0Error;
pub use marker::Amf0Marker;
pub use value::Amf0Value;
