use num_derive::FromPrimitive;

/// FLV file header plus the always-zero `PreviousTagSize0` that precedes the
/// first tag: `"FLV"`, version 1, audio+video present, header size 9.
pub const FLV_FILE_HEADER: [u8; 13] = [
    b'F', b'L', b'V', 0x01, 0x05, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00,
];

/// FLV tag type byte, matching the RTMP message type IDs it's remuxed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum TagType {
    Audio = 0x08,
    Video = 0x09,
    ScriptData = 0x12,
}
