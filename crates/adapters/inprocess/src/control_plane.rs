//! [`ControlPlane`] implementation over the in-memory object store.

use autoproc_app::ports::{ControlPlane, JobDef, MasterDef, StarterDef};
use autoproc_domain::error::AutoProcError;

use crate::engine::InProcessEngine;
use crate::error::EngineError;

impl ControlPlane for InProcessEngine {
    async fn define_master_starter(&self, master: MasterDef) -> Result<(), AutoProcError> {
        tracing::debug!(name = %master.name, "master starter defined");
        self.objects()
            .master_starters
            .insert(master.name.clone(), master);
        Ok(())
    }

    async fn define_master_job(&self, master: MasterDef) -> Result<(), AutoProcError> {
        tracing::debug!(name = %master.name, "master job defined");
        self.objects().master_jobs.insert(master.name.clone(), master);
        Ok(())
    }

    async fn define_starter(&self, starter: StarterDef) -> Result<(), AutoProcError> {
        let mut objects = self.objects();
        if !objects.master_starters.contains_key(&starter.master) {
            return Err(EngineError::UnknownMaster {
                kind: "starter",
                name: starter.master,
            }
            .into());
        }
        tracing::debug!(name = %starter.name, master = %starter.master, "starter defined");
        objects.starters.insert(starter.name.clone(), starter);
        Ok(())
    }

    async fn define_job(&self, job: JobDef) -> Result<(), AutoProcError> {
        let mut objects = self.objects();
        if !objects.master_jobs.contains_key(&job.master) {
            return Err(EngineError::UnknownMaster {
                kind: "job",
                name: job.master,
            }
            .into());
        }
        if !objects.starters.contains_key(&job.starter) {
            return Err(EngineError::UnknownStarter { name: job.starter }.into());
        }
        tracing::debug!(name = %job.name, starter = %job.starter, "job defined");
        objects.jobs.insert(job.name.clone(), job);
        Ok(())
    }

    async fn remove_starter(&self, name: &str) -> Result<Option<StarterDef>, AutoProcError> {
        Ok(self.objects().starters.remove(name))
    }

    async fn remove_job(&self, name: &str) -> Result<Option<JobDef>, AutoProcError> {
        Ok(self.objects().jobs.remove(name))
    }

    async fn starter(&self, name: &str) -> Result<Option<StarterDef>, AutoProcError> {
        Ok(self.objects().starters.get(name).cloned())
    }

    async fn job(&self, name: &str) -> Result<Option<JobDef>, AutoProcError> {
        Ok(self.objects().jobs.get(name).cloned())
    }

    async fn starters(&self) -> Result<Vec<StarterDef>, AutoProcError> {
        Ok(self.objects().starters.values().cloned().collect())
    }

    async fn jobs(&self) -> Result<Vec<JobDef>, AutoProcError> {
        Ok(self.objects().jobs.values().cloned().collect())
    }

    /// Start a new generation. Sequels spawned before the restart are
    /// dropped instead of firing against the reset configuration.
    async fn restart(&self) -> Result<(), AutoProcError> {
        let generation = self.restarted();
        tracing::info!(generation, "control plane restarted");
        Ok(())
    }

    async fn activate_starter(&self, name: &str) -> Result<(), AutoProcError> {
        self.activate(name).map_err(AutoProcError::from)
    }
}
