//! FLV container framing.
//!
//! This crate does not demux FLV files; it remuxes already-decoded RTMP
//! `Audio`/`Video`/`Amf0Data` messages into an FLV byte stream suitable for
//! HTTP-FLV playback. Codec payloads (AVC, AAC, ...) are carried opaquely.

mod define;
mod error;
mod metadata;
mod tag;

pub use define::{FLV_FILE_HEADER, TagType};
pub use error::FlvError;
pub use metadata::prime_metadata;
pub use tag::TagHeader;
