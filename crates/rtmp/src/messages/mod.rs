mod define;
mod error;
mod parser;

pub use define::{DataMessage, DataMessageKind, MessageData, MessageTypeId};
pub use error::MessageError;
