//! The publish session state machine (4.3.3) and its message pump (4.3.5).

mod define;
mod errors;
mod server_session;
pub mod sink;

pub use define::{DEFAULT_WINDOW_ACK_SIZE, RtmpCommand, SessionState};
pub use errors::SessionError;
pub use server_session::Session;
pub use sink::{MessageHandle, PublishSink, PublishSinkError};
