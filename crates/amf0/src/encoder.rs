use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::{Amf0Marker, Amf0Value};

/// Encodes [`Amf0Value`]s onto a `std::io::Write` sink.
pub struct Amf0Encoder;

impl Amf0Encoder {
    pub fn encode(writer: &mut impl Write, value: &Amf0Value) -> io::Result<()> {
        match value {
            Amf0Value::Number(n) => {
                writer.write_u8(Amf0Marker::Number as u8)?;
                writer.write_f64::<BigEndian>(*n)
            }
            Amf0Value::Boolean(b) => {
                writer.write_u8(Amf0Marker::Boolean as u8)?;
                writer.write_u8(*b as u8)
            }
            Amf0Value::String(s) => {
                writer.write_u8(Amf0Marker::String as u8)?;
                Self::write_short_string(writer, s)
            }
            Amf0Value::LongString(s) => {
                writer.write_u8(Amf0Marker::LongString as u8)?;
                writer.write_u32::<BigEndian>(s.len() as u32)?;
                writer.write_all(s.as_bytes())
            }
            Amf0Value::Null => writer.write_u8(Amf0Marker::Null as u8),
            Amf0Value::Undefined => writer.write_u8(Amf0Marker::Undefined as u8),
            Amf0Value::Object(props) => {
                writer.write_u8(Amf0Marker::Object as u8)?;
                Self::write_properties(writer, props)
            }
            Amf0Value::EcmaArray(props) => {
                writer.write_u8(Amf0Marker::EcmaArray as u8)?;
                writer.write_u32::<BigEndian>(props.len() as u32)?;
                Self::write_properties(writer, props)
            }
            Amf0Value::StrictArray(values) => {
                writer.write_u8(Amf0Marker::StrictArray as u8)?;
                writer.write_u32::<BigEndian>(values.len() as u32)?;
                for value in values {
                    Self::encode(writer, value)?;
                }
                Ok(())
            }
            Amf0Value::Date { timestamp, timezone } => {
                writer.write_u8(Amf0Marker::Date as u8)?;
                writer.write_f64::<BigEndian>(*timestamp)?;
                writer.write_i16::<BigEndian>(*timezone)
            }
        }
    }

    /// Encodes each value in sequence, as used for a command message body
    /// (`commandName`, `transactionId`, `commandObject`, ...).
    pub fn encode_all<'a>(writer: &mut impl Write, values: impl IntoIterator<Item = &'a Amf0Value>) -> io::Result<()> {
        for value in values {
            Self::encode(writer, value)?;
        }
        Ok(())
    }

    fn write_short_string(writer: &mut impl Write, s: &str) -> io::Result<()> {
        writer.write_u16::<BigEndian>(s.len() as u16)?;
        writer.write_all(s.as_bytes())
    }

    fn write_properties(writer: &mut impl Write, props: &[(String, Amf0Value)]) -> io::Result<()> {
        for (key, value) in props {
            Self::write_short_string(writer, key)?;
            Self::encode(writer, value)?;
        }
        writer.write_all(&crate::marker::OBJECT_END_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Amf0Decoder;

    #[test]
    fn round_trips_object() {
        let value = Amf0Value::object([
            ("level", Amf0Value::string("status")),
            ("code", Amf0Value::string("NetStream.Publish.Start")),
        ]);

        let mut buf = Vec::new();
        Amf0Encoder::encode(&mut buf, &value).unwrap();

        let decoded = Amf0Decoder::new(&buf).decode_next().unwrap().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn round_trips_command_sequence() {
        let values = vec![Amf0Value::string("connect"), Amf0Value::Number(1.0), Amf0Value::Null];

        let mut buf = Vec::new();
        Amf0Encoder::encode_all(&mut buf, &values).unwrap();

        let decoded = Amf0Decoder::new(&buf).decode_all().unwrap();
        assert_eq!(decoded, values);
    }
}
