//! Snapshot document — the persisted desired enablement state.
//!
//! Entries are deliberately loose (optional fields, string type tags) so a
//! single malformed row can be reported and skipped while the rest of the
//! document still applies.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::param::{ParamValue, Params, PropType};
use crate::time::Timestamp;

/// Full enablement state of procedures, schedules, sequels and restrictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<Timestamp>,
    pub restrictions: Vec<RestrictionEntry>,
    pub procedures: Vec<ProcedureEntry>,
    pub schedules: Vec<ScheduleEntry>,
    pub sequels: Vec<SequelEntry>,
}

/// Restriction of one process type; `None` means unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionEntry {
    pub process: String,
    #[serde(default)]
    pub excludes: Option<String>,
}

/// An enabled procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureEntry {
    pub name: String,
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub properties: Vec<PropEntry>,
}

/// An enabled time schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub process: String,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub message: Vec<PropEntry>,
}

/// An enabled sequel from `process` to `continuation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequelEntry {
    pub process: String,
    pub continuation: String,
}

/// A `{name, type, value}` property in its persisted string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl PropEntry {
    #[must_use]
    pub fn from_value(name: impl Into<String>, value: &ParamValue) -> Self {
        Self {
            name: name.into(),
            prop_type: value.type_tag().to_string(),
            value: match value {
                ParamValue::Null => None,
                other => Some(other.to_string()),
            },
        }
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an unknown tag or a value not
    /// matching its tag.
    pub fn to_value(&self) -> Result<ParamValue, ValidationError> {
        let tag: PropType = self.prop_type.parse()?;
        ParamValue::parse(tag, self.value.as_deref().unwrap_or_default())
    }
}

/// Typed parameters from persisted properties.
///
/// # Errors
///
/// Fails on the first property that does not convert.
pub fn params_from_props(props: &[PropEntry]) -> Result<Params, ValidationError> {
    props
        .iter()
        .map(|p| Ok((p.name.clone(), p.to_value()?)))
        .collect()
}

/// Persisted properties from typed parameters.
#[must_use]
pub fn props_from_params(params: &Params) -> Vec<PropEntry> {
    params
        .iter()
        .map(|(name, value)| PropEntry::from_value(name, value))
        .collect()
}

/// Rebuild a JSON object message from its flattened properties.
///
/// # Errors
///
/// Fails on the first property that does not convert.
pub fn message_from_props(props: &[PropEntry]) -> Result<serde_json::Value, ValidationError> {
    let fields = props
        .iter()
        .map(|p| Ok((p.name.clone(), p.to_value()?.to_json())))
        .collect::<Result<serde_json::Map<_, _>, ValidationError>>()?;
    Ok(serde_json::Value::Object(fields))
}

/// Flatten the top-level fields of a JSON object message.
#[must_use]
pub fn props_from_message(message: &serde_json::Value) -> Vec<PropEntry> {
    message
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(name, value)| PropEntry::from_value(name, &ParamValue::from_json(value)))
                .collect()
        })
        .unwrap_or_default()
}
