//! Control plane port — the external job-control engine.
//!
//! The engine only knows flat, string-keyed objects: *master starters* and
//! *master jobs* are templates, *starters* activate *jobs*, and every
//! starter/job names the master it is derived from. The controller keeps
//! this object graph consistent with the process automation model; how the
//! engine actually runs work is not its concern.

use std::collections::BTreeMap;
use std::future::Future;

use autoproc_domain::error::AutoProcError;

/// Free-form properties attached to control-plane objects.
pub type Props = BTreeMap<String, serde_json::Value>;

/// Template a starter or job is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterDef {
    pub name: String,
    pub description: String,
    /// Engine-side implementation resolved for this master.
    pub implementation: String,
    pub props: Props,
}

/// A starter activating the jobs bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StarterDef {
    pub name: String,
    pub master: String,
    pub description: String,
    pub props: Props,
}

/// A job run whenever its starter activates.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDef {
    pub name: String,
    pub master: String,
    pub starter: String,
    pub description: String,
    pub props: Props,
}

/// Control surface of the job-control engine.
///
/// Defining an object under an existing name replaces it.
pub trait ControlPlane {
    /// Define (or replace) a master starter.
    fn define_master_starter(
        &self,
        master: MasterDef,
    ) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Define (or replace) a master job.
    fn define_master_job(
        &self,
        master: MasterDef,
    ) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Define (or replace) a starter.
    fn define_starter(
        &self,
        starter: StarterDef,
    ) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Define (or replace) a job.
    fn define_job(&self, job: JobDef) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Remove a starter, returning it if it existed.
    fn remove_starter(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<StarterDef>, AutoProcError>> + Send;

    /// Remove a job, returning it if it existed.
    fn remove_job(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<JobDef>, AutoProcError>> + Send;

    /// Look up a starter by name.
    fn starter(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<StarterDef>, AutoProcError>> + Send;

    /// Look up a job by name.
    fn job(&self, name: &str)
    -> impl Future<Output = Result<Option<JobDef>, AutoProcError>> + Send;

    /// All starters currently defined.
    fn starters(&self) -> impl Future<Output = Result<Vec<StarterDef>, AutoProcError>> + Send;

    /// All jobs currently defined.
    fn jobs(&self) -> impl Future<Output = Result<Vec<JobDef>, AutoProcError>> + Send;

    /// Stop, re-initialize and start the engine with its current objects.
    fn restart(&self) -> impl Future<Output = Result<(), AutoProcError>> + Send;

    /// Activate a starter right away, independent of its own trigger.
    fn activate_starter(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), AutoProcError>> + Send;
}
