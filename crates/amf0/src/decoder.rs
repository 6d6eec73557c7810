use bytes::Buf;
use num_traits::FromPrimitive;

use crate::{Amf0Error, Amf0Marker, Amf0Value};

/// Decodes a sequence of AMF0 values out of a byte slice.
///
/// Command messages and `onMetaData` payloads are both just "however many
/// AMF0 values fit in the message body", so callers typically loop
/// [`Amf0Decoder::decode_next`] until it returns `None`.
pub struct Amf0Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }

    pub fn decode_all(mut self) -> Result<Vec<Amf0Value>, Amf0Error> {
        let mut values = Vec::new();
        while let Some(value) = self.decode_next()? {
            values.push(value);
        }
        Ok(values)
    }

    pub fn decode_next(&mut self) -> Result<Option<Amf0Value>, Amf0Error> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        self.decode_value().map(Some)
    }

    fn decode_value(&mut self) -> Result<Amf0Value, Amf0Error> {
        let marker_byte = self.read_u8()?;
        let marker = Amf0Marker::from_u8(marker_byte).ok_or(Amf0Error::UnknownMarker(marker_byte))?;

        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.read_f64()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.read_u8()? != 0)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_short_string()?)),
            Amf0Marker::LongString => Ok(Amf0Value::LongString(self.read_long_string()?)),
            Amf0Marker::Null => Ok(Amf0Value::Null),
            Amf0Marker::Undefined => Ok(Amf0Value::Undefined),
            Amf0Marker::Object => Ok(Amf0Value::Object(self.decode_properties()?)),
            Amf0Marker::EcmaArray => {
                let _associative_count = self.read_u32()?;
                Ok(Amf0Value::EcmaArray(self.decode_properties()?))
            }
            Amf0Marker::StrictArray => {
                let count = self.read_u32()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(self.decode_value()?);
                }
                Ok(Amf0Value::StrictArray(values))
            }
            Amf0Marker::Date => {
                let timestamp = self.read_f64()?;
                let timezone = self.read_u16()? as i16;
                Ok(Amf0Value::Date { timestamp, timezone })
            }
            other => Err(Amf0Error::UnsupportedType(other)),
        }
    }

    /// Reads the key/value pairs of an `Object` or `EcmaArray` up to and
    /// including the terminating empty-key/[`Amf0Marker::ObjectEnd`] pair.
    fn decode_properties(&mut self) -> Result<Vec<(String, Amf0Value)>, Amf0Error> {
        let mut props = Vec::new();
        loop {
            if self.buf.len() >= 3 && self.buf[0..2] == [0x00, 0x00] && self.buf[2] == Amf0Marker::ObjectEnd as u8 {
                self.buf.advance(3);
                return Ok(props);
            }
            let key = self.read_short_string()?;
            let value = self.decode_value()?;
            props.push((key, value));
        }
    }

    fn require(&self, n: usize) -> Result<(), Amf0Error> {
        if self.buf.len() < n {
            Err(Amf0Error::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    fn read_u8(&mut self) -> Result<u8, Amf0Error> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, Amf0Error> {
        self.require(2)?;
        Ok(self.buf.get_u16())
    }

    fn read_u32(&mut self) -> Result<u32, Amf0Error> {
        self.require(4)?;
        Ok(self.buf.get_u32())
    }

    fn read_f64(&mut self) -> Result<f64, Amf0Error> {
        self.require(8)?;
        Ok(self.buf.get_f64())
    }

    fn read_short_string(&mut self) -> Result<String, Amf0Error> {
        let len = self.read_u16()? as usize;
        self.require(len)?;
        let bytes = self.buf[..len].to_vec();
        self.buf.advance(len);
        Ok(String::from_utf8(bytes)?)
    }

    fn read_long_string(&mut self) -> Result<String, Amf0Error> {
        let len = self.read_u32()? as usize;
        self.require(len)?;
        let bytes = self.buf[..len].to_vec();
        self.buf.advance(len);
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_number() {
        let mut bytes = vec![Amf0Marker::Number as u8];
        bytes.extend_from_slice(&31.0f64.to_be_bytes());
        let value = Amf0Decoder::new(&bytes).decode_next().unwrap().unwrap();
        assert_eq!(value, Amf0Value::Number(31.0));
    }

    #[test]
    fn decodes_object_with_ordered_properties() {
        let mut bytes = vec![Amf0Marker::Object as u8];
        bytes.extend_from_slice(&[0x00, 0x05]);
        bytes.extend_from_slice(b"level");
        bytes.push(Amf0Marker::String as u8);
        bytes.extend_from_slice(&[0x00, 0x06]);
        bytes.extend_from_slice(b"status");
        bytes.extend_from_slice(&[0x00, 0x00, 0x09]);

        let value = Amf0Decoder::new(&bytes).decode_next().unwrap().unwrap();
        match value {
            Amf0Value::Object(props) => {
                assert_eq!(props.len(), 1);
                assert_eq!(props[0].0, "level");
                assert_eq!(props[0].1.as_str(), Some("status"));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn decodes_multiple_values_from_command_body() {
        let mut bytes = vec![Amf0Marker::String as u8];
        bytes.extend_from_slice(&[0x00, 0x07]);
        bytes.extend_from_slice(b"connect");
        bytes.push(Amf0Marker::Number as u8);
        bytes.extend_from_slice(&1.0f64.to_be_bytes());

        let values = Amf0Decoder::new(&bytes).decode_all().unwrap();
        assert_eq!(values, vec![Amf0Value::string("connect"), Amf0Value::Number(1.0)]);
    }

    #[test]
    fn rejects_unknown_marker() {
        let err = Amf0Decoder::new(&[0xFE]).decode_next().unwrap_err();
        assert!(matches!(err, Amf0Error::UnknownMarker(0xFE)));
    }
}
