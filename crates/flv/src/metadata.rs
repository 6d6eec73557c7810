use bytes::Bytes;
use tidalcast_amf0::{Amf0Decoder, Amf0Value};

/// Implements 4.5's priming rule: decode the publisher's first AMF0 data
/// message until a top-level string value other than `"@setDataFrame"` is
/// read, then retain the remainder verbatim as the primed metadata tag.
///
/// Encoders such as OBS prefix the payload with an `"@setDataFrame"` AMF0
/// string naming the target handler; that string is an RTMP-only addressing
/// convention with no meaning in an FLV file, so it is stripped when present.
/// `None` if the first decoded value isn't a string at all — priming fails
/// outright per 4.5, and the source caches no metadata.
pub fn prime_metadata(payload: &Bytes) -> Option<Bytes> {
    let mut decoder = Amf0Decoder::new(payload);
    match decoder.decode_next() {
        Ok(Some(Amf0Value::String(s))) if s == "@setDataFrame" => Some(payload.slice_ref(decoder.remaining())),
        Ok(Some(Amf0Value::String(_))) => Some(payload.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidalcast_amf0::Amf0Encoder;

    fn encode(values: &[Amf0Value]) -> Bytes {
        let mut buf = Vec::new();
        Amf0Encoder::encode_all(&mut buf, values).unwrap();
        buf.into()
    }

    #[test]
    fn strips_leading_set_data_frame_marker() {
        let payload = encode(&[
            Amf0Value::string("@setDataFrame"),
            Amf0Value::string("onMetaData"),
            Amf0Value::object([("width", Amf0Value::Number(1920.0))]),
        ]);

        let primed = prime_metadata(&payload).unwrap();
        let expected = encode(&[
            Amf0Value::string("onMetaData"),
            Amf0Value::object([("width", Amf0Value::Number(1920.0))]),
        ]);

        assert_eq!(primed, expected);
    }

    #[test]
    fn leaves_payload_untouched_without_marker() {
        let payload = encode(&[Amf0Value::string("onMetaData")]);
        assert_eq!(prime_metadata(&payload).unwrap(), payload);
    }

    #[test]
    fn fails_when_leading_value_is_not_a_string() {
        let payload = encode(&[Amf0Value::Number(1.0)]);
        assert!(prime_metadata(&payload).is_none());
    }
}
