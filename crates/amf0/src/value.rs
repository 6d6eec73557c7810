/// A decoded AMF0 value.
///
/// `Object` and `EcmaArray` are stored as an ordered list of key/value pairs
/// rather than a map: AMF0 property order is observable on the wire (Flash
/// players and `NetConnection.connect` responses both rely on it) and a
/// `Vec` preserves insertion order for free.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Object(Vec<(String, Amf0Value)>),
    Null,
    Undefined,
    EcmaArray(Vec<(String, Amf0Value)>),
    StrictArray(Vec<Amf0Value>),
    Date { timestamp: f64, timezone: i16 },
    LongString(String),
}

impl Amf0Value {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn object(props: impl IntoIterator<Item = (impl Into<String>, Amf0Value)>) -> Self {
        Self::Object(props.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::LongString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Amf0Value)]> {
        match self {
            Self::Object(props) | Self::EcmaArray(props) => Some(props),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl From<f64> for Amf0Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Amf0Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Amf0Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Amf0Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
