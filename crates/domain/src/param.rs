//! Typed procedure parameters and schedule message properties.
//!
//! Snapshots carry every value as a `(type tag, string)` pair; [`ParamValue`]
//! recovers the typed value from that form and gives it back.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ordered name → value mapping of procedure parameters.
pub type Params = BTreeMap<String, ParamValue>;

/// Type tag of a persisted property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropType {
    Text,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PropType {
    /// The tag as written in a snapshot.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Number => "NUMBER",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Null => "NULL",
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        [
            Self::Text,
            Self::Number,
            Self::Integer,
            Self::Boolean,
            Self::Null,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(tag))
        .ok_or_else(|| ValidationError::UnknownPropType(s.to_string()))
    }
}

/// A single typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Recover a typed value from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParamValue`] when `raw` does not
    /// parse as `tag`.
    pub fn parse(tag: PropType, raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidParamValue {
            tag: tag.as_str(),
            raw: raw.to_string(),
        };
        match tag {
            PropType::Text => Ok(Self::Text(raw.to_string())),
            PropType::Number => raw.trim().parse().map(Self::Number).map_err(|_| invalid()),
            PropType::Integer => raw.trim().parse().map(Self::Integer).map_err(|_| invalid()),
            PropType::Boolean => match raw.trim() {
                b if b.eq_ignore_ascii_case("true") => Ok(Self::Boolean(true)),
                b if b.eq_ignore_ascii_case("false") => Ok(Self::Boolean(false)),
                _ => Err(invalid()),
            },
            PropType::Null => Ok(Self::Null),
        }
    }

    /// Tag describing this value's type.
    #[must_use]
    pub fn type_tag(&self) -> PropType {
        match self {
            Self::Null => PropType::Null,
            Self::Boolean(_) => PropType::Boolean,
            Self::Integer(_) => PropType::Integer,
            Self::Number(_) => PropType::Number,
            Self::Text(_) => PropType::Text,
        }
    }

    /// Convert a JSON value, serializing nested arrays and objects as text.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Number))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            nested => Self::Text(nested.to_string()),
        }
    }

    /// JSON form of this value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(b) => b.fmt(f),
            Self::Integer(i) => i.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_tags_case_insensitively() {
        assert_eq!("text".parse::<PropType>().unwrap(), PropType::Text);
        assert_eq!("Integer".parse::<PropType>().unwrap(), PropType::Integer);
        assert_eq!(" NULL ".parse::<PropType>().unwrap(), PropType::Null);
    }

    #[test]
    fn should_reject_unknown_tag() {
        assert_eq!(
            "DATE".parse::<PropType>().unwrap_err(),
            ValidationError::UnknownPropType("DATE".to_string())
        );
    }

    #[test]
    fn should_recover_typed_values_from_strings() {
        assert_eq!(
            ParamValue::parse(PropType::Text, "hello").unwrap(),
            ParamValue::Text("hello".to_string())
        );
        assert_eq!(
            ParamValue::parse(PropType::Number, "1.5").unwrap(),
            ParamValue::Number(1.5)
        );
        assert_eq!(
            ParamValue::parse(PropType::Integer, " 42 ").unwrap(),
            ParamValue::Integer(42)
        );
        assert_eq!(
            ParamValue::parse(PropType::Boolean, "True").unwrap(),
            ParamValue::Boolean(true)
        );
        assert_eq!(
            ParamValue::parse(PropType::Null, "whatever").unwrap(),
            ParamValue::Null
        );
    }

    #[test]
    fn should_reject_value_not_matching_tag() {
        assert!(matches!(
            ParamValue::parse(PropType::Integer, "4.2"),
            Err(ValidationError::InvalidParamValue { tag: "INTEGER", .. })
        ));
        assert!(ParamValue::parse(PropType::Boolean, "yes").is_err());
    }

    #[test]
    fn should_give_back_tag_and_string_form() {
        let value = ParamValue::Integer(7);
        assert_eq!(value.type_tag(), PropType::Integer);
        assert_eq!(
            ParamValue::parse(value.type_tag(), &value.to_string()).unwrap(),
            value
        );
        assert_eq!(ParamValue::Null.to_string(), "");
    }

    #[test]
    fn should_convert_json_scalars() {
        assert_eq!(
            ParamValue::from_json(&serde_json::json!(3)),
            ParamValue::Integer(3)
        );
        assert_eq!(
            ParamValue::from_json(&serde_json::json!(0.25)),
            ParamValue::Number(0.25)
        );
        assert_eq!(
            ParamValue::from_json(&serde_json::json!({"a": 1})),
            ParamValue::Text("{\"a\":1}".to_string())
        );
        assert_eq!(ParamValue::Boolean(false).to_json(), serde_json::json!(false));
    }
}
