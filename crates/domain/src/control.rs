//! Process controls — sequels chaining processes and time schedules.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::process::ProcessType;

/// Rule running `successor` whenever `precursor` completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequelControl {
    pub precursor: ProcessType,
    pub successor: ProcessType,
    pub enabled: bool,
}

impl SequelControl {
    /// # Errors
    ///
    /// Returns [`ValidationError::KindMismatch`] unless the successor accepts
    /// the precursor's result as its message.
    pub fn new(
        precursor: ProcessType,
        successor: ProcessType,
        enabled: bool,
    ) -> Result<Self, ValidationError> {
        if !successor
            .msg_kind
            .is_assignable_from(&precursor.result_kind)
        {
            return Err(ValidationError::KindMismatch {
                precursor: precursor.name,
                successor: successor.name,
                expected: successor.msg_kind.to_string(),
                actual: precursor.result_kind.to_string(),
            });
        }
        Ok(Self {
            precursor,
            successor,
            enabled,
        })
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Continue {} with {}",
            self.precursor.name, self.successor.name
        )
    }
}

/// Time-pattern-triggered invocation of a process with a fixed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeScheduleControl {
    pub schedule_id: String,
    pub time_pattern: String,
    pub process: String,
    pub message: serde_json::Value,
}

impl TimeScheduleControl {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the schedule id or time pattern is
    /// blank, or the message is not a flat JSON object. Schedule messages are
    /// persisted as typed scalar properties, so nested fields are refused.
    pub fn new(
        process: impl Into<String>,
        schedule_id: impl Into<String>,
        time_pattern: impl Into<String>,
        message: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let schedule = Self {
            schedule_id: schedule_id.into(),
            time_pattern: time_pattern.into(),
            process: process.into(),
            message,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// # Errors
    ///
    /// See [`TimeScheduleControl::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schedule_id.trim().is_empty() {
            return Err(ValidationError::EmptyScheduleId);
        }
        if self.time_pattern.trim().is_empty() {
            return Err(ValidationError::EmptyTimePattern);
        }
        let Some(fields) = self.message.as_object() else {
            return Err(ValidationError::InvalidScheduleMessage);
        };
        if let Some((field, _)) = fields
            .iter()
            .find(|(_, value)| value.is_object() || value.is_array())
        {
            return Err(ValidationError::NestedScheduleField {
                field: field.clone(),
            });
        }
        Ok(())
    }
}
