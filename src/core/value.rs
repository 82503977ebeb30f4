// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The dynamic, attribute-keyed value type traded by the writer and reader.
//!
//! A [`CodecValue`] is a tagged sum over primitive, byte-sequence, ordered
//! sequence, and struct-shaped (field-map) values. It carries no
//! schema-specific semantics of its own (no special `Time`/`Duration`
//! variants) — `builtin_interfaces::msg::Time` and `Duration` are ordinary
//! nested structs as far as this type is concerned.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An ordered field-name -> value mapping.
///
/// Declaration order matters: the reader must emit decoded struct fields in
/// the order the schema declares them, so this is a small insertion-ordered
/// map rather than a `HashMap`, which `serde_json`'s default `Map`
/// (alphabetical without the `preserve_order` feature) would not guarantee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedMessage {
    entries: Vec<(String, CodecValue)>,
}

impl DecodedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a field, overwriting any existing value under the same name
    /// without disturbing its position.
    pub fn insert(&mut self, name: impl Into<String>, value: CodecValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&CodecValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CodecValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, CodecValue)> for DecodedMessage {
    fn from_iter<T: IntoIterator<Item = (String, CodecValue)>>(iter: T) -> Self {
        let mut msg = DecodedMessage::new();
        for (k, v) in iter {
            msg.insert(k, v);
        }
        msg
    }
}

impl Serialize for DecodedMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DecodedMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MsgVisitor;

        impl<'de> Visitor<'de> for MsgVisitor {
            type Value = DecodedMessage;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to value")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut msg = DecodedMessage::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, CodecValue>()? {
                    msg.insert(key, value);
                }
                Ok(msg)
            }
        }

        deserializer.deserialize_map(MsgVisitor)
    }
}

/// The dynamic value exchanged with the writer/reader: primitive |
/// byte-sequence | ordered sequence | struct-shaped map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodecValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<CodecValue>),
    Struct(DecodedMessage),
    Null,
}

impl CodecValue {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CodecValue::Int8(_)
                | CodecValue::Int16(_)
                | CodecValue::Int32(_)
                | CodecValue::Int64(_)
                | CodecValue::UInt8(_)
                | CodecValue::UInt16(_)
                | CodecValue::UInt32(_)
                | CodecValue::UInt64(_)
                | CodecValue::Float32(_)
                | CodecValue::Float64(_)
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CodecValue::Int8(v) => Some(*v as i64),
            CodecValue::Int16(v) => Some(*v as i64),
            CodecValue::Int32(v) => Some(*v as i64),
            CodecValue::Int64(v) => Some(*v),
            CodecValue::UInt8(v) => Some(*v as i64),
            CodecValue::UInt16(v) => Some(*v as i64),
            CodecValue::UInt32(v) => Some(*v as i64),
            CodecValue::UInt64(v) => i64::try_from(*v).ok(),
            CodecValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CodecValue::UInt8(v) => Some(*v as u64),
            CodecValue::UInt16(v) => Some(*v as u64),
            CodecValue::UInt32(v) => Some(*v as u64),
            CodecValue::UInt64(v) => Some(*v),
            CodecValue::Int8(v) if *v >= 0 => Some(*v as u64),
            CodecValue::Int16(v) if *v >= 0 => Some(*v as u64),
            CodecValue::Int32(v) if *v >= 0 => Some(*v as u64),
            CodecValue::Int64(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Float32(v) => Some(*v as f64),
            CodecValue::Float64(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CodecValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CodecValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&DecodedMessage> {
        match self {
            CodecValue::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Bool(_) => "bool",
            CodecValue::Int8(_) => "int8",
            CodecValue::Int16(_) => "int16",
            CodecValue::Int32(_) => "int32",
            CodecValue::Int64(_) => "int64",
            CodecValue::UInt8(_) => "uint8",
            CodecValue::UInt16(_) => "uint16",
            CodecValue::UInt32(_) => "uint32",
            CodecValue::UInt64(_) => "uint64",
            CodecValue::Float32(_) => "float32",
            CodecValue::Float64(_) => "float64",
            CodecValue::String(_) => "string",
            CodecValue::Bytes(_) => "bytes",
            CodecValue::Array(_) => "array",
            CodecValue::Struct(_) => "struct",
            CodecValue::Null => "null",
        }
    }
}

impl fmt::Display for CodecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecValue::Bool(v) => write!(f, "{v}"),
            CodecValue::Int8(v) => write!(f, "{v}"),
            CodecValue::Int16(v) => write!(f, "{v}"),
            CodecValue::Int32(v) => write!(f, "{v}"),
            CodecValue::Int64(v) => write!(f, "{v}"),
            CodecValue::UInt8(v) => write!(f, "{v}"),
            CodecValue::UInt16(v) => write!(f, "{v}"),
            CodecValue::UInt32(v) => write!(f, "{v}"),
            CodecValue::UInt64(v) => write!(f, "{v}"),
            CodecValue::Float32(v) => write!(f, "{v}"),
            CodecValue::Float64(v) => write!(f, "{v}"),
            CodecValue::String(v) => write!(f, "{v}"),
            CodecValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            CodecValue::Array(v) => write!(f, "[{} items]", v.len()),
            CodecValue::Struct(v) => write!(f, "{{{} fields}}", v.len()),
            CodecValue::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut msg = DecodedMessage::new();
        msg.insert("z", CodecValue::Int32(1));
        msg.insert("a", CodecValue::Int32(2));
        let keys: Vec<&str> = msg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut msg = DecodedMessage::new();
        msg.insert("a", CodecValue::Int32(1));
        msg.insert("b", CodecValue::Int32(2));
        msg.insert("a", CodecValue::Int32(3));
        let keys: Vec<&str> = msg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(msg.get("a"), Some(&CodecValue::Int32(3)));
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(CodecValue::Int32(5).as_i64(), Some(5));
        assert_eq!(CodecValue::UInt8(5).as_f64(), Some(5.0));
        assert_eq!(CodecValue::String("x".into()).as_i64(), None);
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let mut msg = DecodedMessage::new();
        msg.insert("sec", CodecValue::Int32(1));
        msg.insert("nsec", CodecValue::UInt32(2));
        let json = serde_json::to_string(&CodecValue::Struct(msg.clone())).unwrap();
        let back: CodecValue = serde_json::from_str(&json).unwrap();
        match back {
            CodecValue::Struct(m) => {
                let keys: Vec<&str> = m.iter().map(|(k, _)| k).collect();
                assert_eq!(keys, vec!["sec", "nsec"]);
            }
            _ => panic!("expected struct"),
        }
    }
}
