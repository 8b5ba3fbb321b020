//! Process types — named, typed units of automation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AutoProcError, ValidationError};
use crate::naming::{SCHEDULE_DELIMITER, SEQUEL_DELIMITER};
use crate::restriction::Restriction;

/// Name of a message or result type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when a value of kind `other` can be used where `self` is expected.
    #[must_use]
    pub fn is_assignable_from(&self, other: &Kind) -> bool {
        self == other
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered automation process.
///
/// The name is the only identity: two process types are the same process
/// when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessType {
    pub name: String,
    pub description: String,
    pub msg_kind: Kind,
    pub result_kind: Kind,
    pub restriction: Option<Restriction>,
}

impl ProcessType {
    /// Create a builder for constructing a [`ProcessType`].
    #[must_use]
    pub fn builder() -> ProcessTypeBuilder {
        ProcessTypeBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `name` contains a naming delimiter ([`ValidationError::ReservedCharacter`])
    pub fn validate(&self) -> Result<(), AutoProcError> {
        validate_process_name(&self.name)?;
        Ok(())
    }

    /// `true` when this process may run with `state_ctx`.
    #[must_use]
    pub fn permits(&self, state_ctx: Option<&str>) -> bool {
        !self
            .restriction
            .as_ref()
            .is_some_and(|r| r.is_restricted(state_ctx))
    }
}

impl PartialEq for ProcessType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ProcessType {}

/// Reject names that cannot be encoded into control-plane identifiers.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] or [`ValidationError::ReservedCharacter`].
pub fn validate_process_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if let Some(character) = name
        .chars()
        .find(|c| *c == SCHEDULE_DELIMITER || *c == SEQUEL_DELIMITER)
    {
        return Err(ValidationError::ReservedCharacter {
            name: name.to_string(),
            character,
        });
    }
    Ok(())
}

/// Step-by-step builder for [`ProcessType`].
#[derive(Debug, Default)]
pub struct ProcessTypeBuilder {
    name: Option<String>,
    description: Option<String>,
    msg_kind: Option<Kind>,
    result_kind: Option<Kind>,
    restriction: Option<Restriction>,
}

impl ProcessTypeBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn msg_kind(mut self, kind: impl Into<String>) -> Self {
        self.msg_kind = Some(Kind::new(kind));
        self
    }

    #[must_use]
    pub fn result_kind(mut self, kind: impl Into<String>) -> Self {
        self.result_kind = Some(Kind::new(kind));
        self
    }

    #[must_use]
    pub fn restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }

    /// Consume the builder, validate, and return a [`ProcessType`].
    ///
    /// Message and result kinds default to `json`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoProcError::Validation`] if the name is missing or invalid.
    pub fn build(self) -> Result<ProcessType, AutoProcError> {
        let process = ProcessType {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            msg_kind: self.msg_kind.unwrap_or_else(|| Kind::new("json")),
            result_kind: self.result_kind.unwrap_or_else(|| Kind::new("json")),
            restriction: self.restriction,
        };
        process.validate()?;
        Ok(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice() -> ProcessType {
        ProcessType::builder()
            .name("Invoice")
            .description("Create invoices")
            .msg_kind("Order")
            .result_kind("Invoice")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_process_type_when_name_is_valid() {
        let process = invoice();
        assert_eq!(process.name, "Invoice");
        assert_eq!(process.msg_kind.as_str(), "Order");
        assert_eq!(process.result_kind.as_str(), "Invoice");
        assert!(process.restriction.is_none());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = ProcessType::builder().name("  ").build();
        assert!(matches!(
            result,
            Err(AutoProcError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_name_with_naming_delimiter() {
        for (name, reserved) in [("a@b", '@'), ("a>b", '>'), ("a-=>b", '>')] {
            let result = ProcessType::builder().name(name).build();
            match result {
                Err(AutoProcError::Validation(ValidationError::ReservedCharacter {
                    character,
                    ..
                })) => assert_eq!(character, reserved),
                other => panic!("expected reserved character for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn should_accept_name_shaped_like_naming_suffix() {
        for name in [
            "Order-Starter",
            "Order-Cntrl",
            "Order-Sequel",
            "Order-Schedule",
            "a:b",
        ] {
            assert!(validate_process_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn should_compare_by_name_only() {
        let mut other = invoice();
        other.description = "something else".to_string();
        other.msg_kind = Kind::new("Other");
        assert_eq!(other, invoice());
    }

    #[test]
    fn should_refuse_restricted_state() {
        let mut process = invoice();
        assert!(process.permits(Some("locked")));

        process.restriction = Some(Restriction::new(["locked"]).unwrap());
        assert!(!process.permits(Some("account LOCKED")));
        assert!(process.permits(Some("unlocked")));
        assert!(process.permits(None));
    }

    #[test]
    fn should_assign_equal_kinds_only() {
        assert!(Kind::new("Order").is_assignable_from(&Kind::new("Order")));
        assert!(!Kind::new("Order").is_assignable_from(&Kind::new("Invoice")));
    }
}
