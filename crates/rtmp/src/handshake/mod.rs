mod define;
mod error;
mod server;

pub use define::{C0C1_SIZE, HANDSHAKE_BODY_SIZE, RTMP_VERSION, S0S1S2_SIZE};
pub use error::HandshakeError;
pub use server::HandshakeServer;
