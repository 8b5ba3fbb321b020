//! Control-plane naming scheme.
//!
//! The control plane only knows flat string identifiers for starters, jobs
//! and message topics. These builders encode the process ↔ procedure ↔
//! schedule ↔ sequel relationships into those identifiers and the parsers
//! recover them. Every parser fails with a [`NamingError`] on a malformed
//! identifier instead of guessing.
//!
//! For a process `P`, procedure `R` and schedule id `S`:
//!
//! | identifier | form |
//! |---|---|
//! | topic | `Prcs.P` |
//! | message starter | `P-Starter` |
//! | procedure job | `P-=>R` |
//! | control name | `P-Cntrl` |
//! | master control job | `P-Cntrl:MasterAutoJob` |
//! | schedule starter | `P@S-Schedule` |
//! | schedule control job | `P@S-Schedule:AutoJob` |
//! | sequel starter | `P-Sequel` |
//! | sequel control job | `P-Sequel>Q-Cntrl:AutoJob` |

use crate::error::NamingError;

/// Master starter for message-subscribed process starters.
pub const MASTER_PROCESS_STARTER: &str = "AutoProcess-MSG";
/// Master starter for starters chained to another starter's completion.
pub const MASTER_CHAINED_STARTER: &str = "AutoProcess-CHAIN";
/// Master starter for time-scheduled starters.
pub const MASTER_SCHEDULE_STARTER: &str = "AutoProcess-SCHEDULE";

pub const TOPIC_PREFIX: &str = "Prcs.";
pub const STARTER_SUFFIX: &str = "-Starter";
pub const CONTROL_SUFFIX: &str = "-Cntrl";
pub const SEQUEL_SUFFIX: &str = "-Sequel";
pub const SEQUEL_DELIMITER: char = '>';
pub const SCHEDULE_DELIMITER: char = '@';
pub const SCHEDULE_SUFFIX: &str = "-Schedule";
pub const MASTER_AUTOJOB_SUFFIX: &str = ":MasterAutoJob";
pub const AUTOJOB_SUFFIX: &str = ":AutoJob";
pub const SEQUEL_JOB_SUFFIX: &str = "-Cntrl:AutoJob";
pub const PROCEDURE_DELIMITER: &str = "-=>";

/// Property keys understood by the control plane.
pub mod props {
    /// Topic a message starter subscribes to.
    pub const MSG_SUBJECT: &str = "Msg-Subject";
    /// Whether a message starter replies with the process result.
    pub const RETURN_RESULT: &str = "Return-Result";
    /// Allow a master starter to activate its jobs in parallel.
    pub const PARALLEL_START: &str = "Parallel-Start";
    /// Starter whose completion activates a chained starter.
    pub const COMPLETED_STARTER: &str = "Completed-Starter";
    /// Time pattern of a schedule starter.
    pub const SCHEDULE_TIME: &str = "Schedule-Time";
    /// Message a schedule starter runs its process with.
    pub const PROCESS_MSG: &str = "Process-Msg";
    /// Set on a procedure job whose result is discarded.
    pub const NO_RESULT: &str = "No-Result";
    /// Process type name carried by a master control job.
    pub const PROCESS_TYPE: &str = "Process-Type";
    /// Comma-separated restricted states carried by a master control job.
    pub const PROCESS_RESTRICTION: &str = "Process-Restriction";
}

/// Message topic a process listens on.
#[must_use]
pub fn topic(process: &str) -> String {
    format!("{TOPIC_PREFIX}{process}")
}

/// Recover the process name from a [`topic`].
///
/// # Errors
///
/// Returns [`NamingError::MissingPrefix`] when `topic` lacks the topic prefix.
pub fn process_from_topic(topic: &str) -> Result<&str, NamingError> {
    topic
        .strip_prefix(TOPIC_PREFIX)
        .ok_or_else(|| NamingError::MissingPrefix {
            name: topic.to_string(),
            prefix: TOPIC_PREFIX,
        })
}

/// Message starter of a process.
#[must_use]
pub fn starter_name(process: &str) -> String {
    format!("{process}{STARTER_SUFFIX}")
}

/// Recover the process name from a [`starter_name`].
///
/// # Errors
///
/// Returns [`NamingError::MissingSuffix`] when the starter suffix is absent.
pub fn process_from_starter(starter: &str) -> Result<&str, NamingError> {
    strip_suffix(starter, STARTER_SUFFIX)
}

/// Job enabling procedure `procedure` of `process`.
#[must_use]
pub fn procedure_job_name(process: &str, procedure: &str) -> String {
    format!("{process}{PROCEDURE_DELIMITER}{procedure}")
}

/// Split a [`procedure_job_name`] into `(process, procedure)`.
///
/// # Errors
///
/// Returns [`NamingError::MissingDelimiter`] when the procedure delimiter is absent.
pub fn procedure_from_job(job: &str) -> Result<(&str, &str), NamingError> {
    job.split_once(PROCEDURE_DELIMITER)
        .ok_or_else(|| NamingError::MissingDelimiter {
            name: job.to_string(),
            delimiter: PROCEDURE_DELIMITER,
        })
}

/// Control name of a process, the stem of its control jobs.
#[must_use]
pub fn control_name(process: &str) -> String {
    format!("{process}{CONTROL_SUFFIX}")
}

/// Master job every control job of a process is derived from.
#[must_use]
pub fn master_control_job_name(control_name: &str) -> String {
    format!("{control_name}{MASTER_AUTOJOB_SUFFIX}")
}

/// Control job bound to `starter`, optionally qualified by a successor control name.
#[must_use]
pub fn control_job_name(starter: &str, control_name: Option<&str>) -> String {
    match control_name {
        Some(control) if !control.is_empty() => {
            format!("{starter}{SEQUEL_DELIMITER}{control}{AUTOJOB_SUFFIX}")
        }
        _ => format!("{starter}{AUTOJOB_SUFFIX}"),
    }
}

/// Recover the successor process from a sequel control job.
///
/// # Errors
///
/// Returns a [`NamingError`] when the job does not end in the sequel job
/// suffix or carries no sequel delimiter.
pub fn process_from_control_job(job: &str) -> Result<&str, NamingError> {
    let stem = strip_suffix(job, SEQUEL_JOB_SUFFIX)?;
    stem.split_once(SEQUEL_DELIMITER)
        .map(|(_, process)| process)
        .ok_or_else(|| NamingError::MissingDelimiter {
            name: job.to_string(),
            delimiter: ">",
        })
}

/// Starter shared by every sequel of a precursor process.
#[must_use]
pub fn sequel_starter_name(process: &str) -> String {
    format!("{process}{SEQUEL_SUFFIX}")
}

/// Recover the precursor process from a [`sequel_starter_name`].
///
/// # Errors
///
/// Returns [`NamingError::MissingSuffix`] when the sequel suffix is absent.
pub fn process_from_sequel_starter(starter: &str) -> Result<&str, NamingError> {
    strip_suffix(starter, SEQUEL_SUFFIX)
}

/// Starter firing schedule `schedule_id` of `process`.
#[must_use]
pub fn scheduled_starter_name(process: &str, schedule_id: &str) -> String {
    format!("{process}{SCHEDULE_DELIMITER}{schedule_id}{SCHEDULE_SUFFIX}")
}

/// Recover the process name from a [`scheduled_starter_name`].
///
/// # Errors
///
/// Returns a [`NamingError`] unless both the `@` and the schedule suffix are present.
pub fn process_from_scheduled_starter(starter: &str) -> Result<&str, NamingError> {
    split_scheduled_starter(starter).map(|(process, _)| process)
}

/// Recover the schedule id from a [`scheduled_starter_name`].
///
/// # Errors
///
/// Returns a [`NamingError`] unless both the `@` and the schedule suffix are present.
pub fn schedule_id_from_starter(starter: &str) -> Result<&str, NamingError> {
    split_scheduled_starter(starter).map(|(_, schedule_id)| schedule_id)
}

/// `true` if `starter` looks like a schedule starter.
#[must_use]
pub fn is_scheduled_starter(starter: &str) -> bool {
    split_scheduled_starter(starter).is_ok()
}

/// `true` if `job` looks like a sequel control job.
#[must_use]
pub fn is_sequel_control_job(job: &str) -> bool {
    process_from_control_job(job).is_ok()
}

fn split_scheduled_starter(starter: &str) -> Result<(&str, &str), NamingError> {
    let stem = strip_suffix(starter, SCHEDULE_SUFFIX)?;
    stem.split_once(SCHEDULE_DELIMITER)
        .ok_or_else(|| NamingError::MissingDelimiter {
            name: starter.to_string(),
            delimiter: "@",
        })
}

fn strip_suffix<'a>(name: &'a str, suffix: &'static str) -> Result<&'a str, NamingError> {
    name.strip_suffix(suffix)
        .ok_or_else(|| NamingError::MissingSuffix {
            name: name.to_string(),
            suffix,
        })
}
