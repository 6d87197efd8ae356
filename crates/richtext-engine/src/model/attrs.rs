use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value. Attribute maps are small and flat, so only
/// scalar values are supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

/// Attributes of a node or mark, ordered by key so equality and display are
/// deterministic.
pub type Attrs = BTreeMap<String, AttrValue>;

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<u8> for AttrValue {
    fn from(value: u8) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Build an attribute map from key/value pairs.
pub fn attrs<K, V, I>(pairs: I) -> Attrs
where
    K: Into<String>,
    V: Into<AttrValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Render attributes as `{key=value, ...}`, or nothing when empty.
pub(crate) fn fmt_attrs(attrs: &Attrs, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if attrs.is_empty() {
        return Ok(());
    }
    f.write_str("{")?;
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}={value}")?;
    }
    f.write_str("}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attrs_builder_sorts_keys() {
        let a = attrs([("level", AttrValue::from(2)), ("id", AttrValue::from("x"))]);
        let keys: Vec<_> = a.keys().cloned().collect();
        assert_eq!(keys, vec!["id".to_string(), "level".to_string()]);
    }

    #[test]
    fn test_attr_value_json_shape() {
        let a = attrs([
            ("n", AttrValue::Null),
            ("b", AttrValue::from(true)),
            ("i", AttrValue::from(3)),
            ("s", AttrValue::from("x")),
        ]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"b":true,"i":3,"n":null,"s":"x"}"#);
        let back: Attrs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttrValue::from(4).as_int(), Some(4));
        assert_eq!(AttrValue::from("a").as_str(), Some("a"));
        assert_eq!(AttrValue::from(false).as_bool(), Some(false));
        assert!(AttrValue::Null.is_null());
        assert_eq!(AttrValue::from("a").as_int(), None);
    }
}
