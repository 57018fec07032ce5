//! Scalar field values shared by both acquisition paths.
//!
//! Telemetry frames and portal status parameters are both flat
//! `key -> scalar` maps. Booleans are folded into `0`/`1` so every
//! consumer sees one numeric representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Flat map of field-key to scalar value.
pub type ParamMap = BTreeMap<String, FieldValue>;

/// A single scalar reported by the boiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value as delivered, keeping strings verbatim.
    ///
    /// Returns `None` for `null`, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Number(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Like [`from_json`](Self::from_json), but numeric-looking strings
    /// become numbers. Strings that do not parse stay as text.
    pub fn coerce_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(
                s.trim()
                    .parse::<f64>()
                    .map_or_else(|_| Self::Text(s.clone()), Self::Number),
            ),
            other => Self::from_json(other),
        }
    }

    /// Numeric view of the value; text is parsed if it looks numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Truthiness: non-zero numbers and non-empty strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Number(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            FieldValue::Text(s) => Value::String(s),
        }
    }
}

/// Decode a flat JSON object into a [`ParamMap`].
///
/// Non-scalar members are skipped. Anything other than a JSON object is a
/// [`Error::Deserialization`].
pub fn decode_flat_object(text: &str) -> Result<ParamMap, Error> {
    let parsed: Value = serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: text.to_owned(),
    })?;

    let Value::Object(members) = parsed else {
        return Err(Error::Deserialization {
            message: "expected a JSON object".into(),
            body: text.to_owned(),
        });
    };

    let mut map = ParamMap::new();
    for (key, value) in &members {
        match FieldValue::from_json(value) {
            Some(v) => {
                map.insert(key.clone(), v);
            }
            None => tracing::debug!(key = %key, "skipping non-scalar field"),
        }
    }
    Ok(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_fold_to_numbers() {
        assert_eq!(FieldValue::from_json(&json!(true)), Some(FieldValue::Number(1.0)));
        assert_eq!(FieldValue::from_json(&json!(false)), Some(FieldValue::Number(0.0)));
    }

    #[test]
    fn raw_strings_are_kept_verbatim() {
        assert_eq!(
            FieldValue::from_json(&json!("82")),
            Some(FieldValue::Text("82".into()))
        );
    }

    #[test]
    fn coercion_parses_numeric_strings() {
        assert_eq!(FieldValue::coerce_json(&json!("82")), Some(FieldValue::Number(82.0)));
        assert_eq!(FieldValue::coerce_json(&json!(" 7.5 ")), Some(FieldValue::Number(7.5)));
        assert_eq!(
            FieldValue::coerce_json(&json!("OFF")),
            Some(FieldValue::Text("OFF".into()))
        );
        assert_eq!(FieldValue::coerce_json(&json!(null)), None);
    }

    #[test]
    fn decode_skips_nested_members() {
        let map = decode_flat_object(r#"{"B_Tk1": 62.5, "B_STATE": "ON", "nested": {"a": 1}}"#)
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["B_Tk1"], FieldValue::Number(62.5));
        assert_eq!(map["B_STATE"].as_str(), Some("ON"));
    }

    #[test]
    fn decode_rejects_non_objects() {
        assert!(matches!(
            decode_flat_object("[1, 2, 3]"),
            Err(Error::Deserialization { .. })
        ));
        assert!(matches!(
            decode_flat_object("not json"),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn text_values_expose_numeric_view() {
        assert_eq!(FieldValue::Text("40".into()).as_f64(), Some(40.0));
        assert_eq!(FieldValue::Text("n/a".into()).as_f64(), None);
        assert!(!FieldValue::Number(0.0).is_truthy());
        assert!(FieldValue::Number(2.0).is_truthy());
    }

    #[test]
    fn untagged_serialization() {
        let map: ParamMap = [
            ("a".to_owned(), FieldValue::Number(1.5)),
            ("b".to_owned(), FieldValue::Text("x".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(serde_json::to_value(&map).unwrap(), json!({"a": 1.5, "b": "x"}));
    }
}
