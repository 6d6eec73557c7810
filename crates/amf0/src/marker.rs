use num_derive::FromPrimitive;

/// Type tag prefixing every encoded AMF0 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Amf0Marker {
    Number = 0x00,
    Boolean = 0x01,
    String = 0x02,
    Object = 0x03,
    MovieClipMarker = 0x04,
    Null = 0x05,
    Undefined = 0x06,
    Reference = 0x07,
    EcmaArray = 0x08,
    ObjectEnd = 0x09,
    StrictArray = 0x0A,
    Date = 0x0B,
    LongString = 0x0C,
    Unsupported = 0x0D,
    RecordSet = 0x0E,
    XmlDocument = 0x0F,
    TypedObject = 0x10,
    AVMPlusObject = 0x11,
}

/// The three bytes that close an [`Amf0Marker::Object`] or [`Amf0Marker::EcmaArray`]:
/// an empty string key followed by the [`Amf0Marker::ObjectEnd`] tag.
pub const OBJECT_END_MARKER: [u8; 3] = [0x00, 0x00, 0x09];
