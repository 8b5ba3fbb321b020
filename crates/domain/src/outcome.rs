//! Procedure outcomes and their reduction into one process result.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::id::ExecutionId;

static EXCEPTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'[^ ]*Exception[^ ]* ").expect("exception token regex is valid"));

/// Outcome of one procedure run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcedureOutcome {
    /// `result` is set only by procedures producing the process result.
    Succeeded {
        procedure: String,
        result: Option<serde_json::Value>,
    },
    Failed {
        procedure: String,
        message: String,
    },
}

impl ProcedureOutcome {
    #[must_use]
    pub fn procedure(&self) -> &str {
        match self {
            Self::Succeeded { procedure, .. } | Self::Failed { procedure, .. } => procedure,
        }
    }
}

/// Everything the control plane reports back for one process invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub execution_id: Option<ExecutionId>,
    pub outcomes: Vec<ProcedureOutcome>,
}

impl Completion {
    #[must_use]
    pub fn new(execution_id: ExecutionId, outcomes: Vec<ProcedureOutcome>) -> Self {
        Self {
            execution_id: Some(execution_id),
            outcomes,
        }
    }

    /// Results of successful result-producing procedures, in completion order.
    pub fn results(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ProcedureOutcome::Succeeded {
                result: Some(result),
                ..
            } => Some(result),
            _ => None,
        })
    }
}

/// One-line form of a procedure failure message.
///
/// Cuts the message at its first line break (dropping any trace that
/// follows) and removes quoted `'...Exception...'` type names.
#[must_use]
pub fn summarize_failure(process: &str, procedure: &str, message: &str) -> String {
    let first_line = match message.find(['\r', '\n']) {
        Some(idx) if idx > 0 => &message[..idx],
        _ => message,
    };
    let msg = EXCEPTION_TOKEN.replace_all(first_line, "");
    format!("Procedure {procedure} of {process} has failed: {msg}")
}

/// Reduce the outcomes of `process` into its single result.
///
/// # Errors
///
/// - [`ExecutionError::Aggregate`] when any procedure failed; the first
///   failure is the root cause and every failure is summarized.
/// - [`ExecutionError::NoResult`] when no procedure produced a result.
pub fn aggregate(process: &str, completion: &Completion) -> Result<serde_json::Value, ExecutionError> {
    let mut root_cause: Option<&str> = None;
    let mut failures = Vec::new();
    for outcome in &completion.outcomes {
        if let ProcedureOutcome::Failed { procedure, message } = outcome {
            if root_cause.is_none() {
                root_cause = Some(message.as_str());
            }
            failures.push(summarize_failure(process, procedure, message));
        }
    }
    if let Some(root_cause) = root_cause {
        return Err(ExecutionError::Aggregate {
            process: process.to_string(),
            root_cause: root_cause.to_string(),
            failures,
        });
    }

    completion
        .results()
        .next()
        .cloned()
        .ok_or_else(|| ExecutionError::NoResult {
            process: process.to_string(),
        })
}
