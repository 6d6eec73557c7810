/// The RTMP version this server speaks. A client requesting anything else is
/// still answered with 0x03, per 5.2.1: "A server that does not recognize
/// the client's requested version SHOULD respond with 3."
pub const RTMP_VERSION: u8 = 0x03;

/// C1/S1/C2/S2 are each this many bytes (5.2.2/5.2.3).
pub const HANDSHAKE_BODY_SIZE: usize = 1536;

/// C0 (1 byte) followed by C1.
pub const C0C1_SIZE: usize = 1 + HANDSHAKE_BODY_SIZE;

/// S0 (1 byte) followed by S1 and S2.
pub const S0S1S2_SIZE: usize = 1 + HANDSHAKE_BODY_SIZE * 2;
