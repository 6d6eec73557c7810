mod define;
mod error;
mod reader;
mod writer;

pub use define::{EventMessageStreamBegin, EventType, InboundUserControlEvent};
pub use error::EventMessagesError;
