//! Execution agent — runs a process by name and reduces its outcomes.
//!
//! Name resolution, the restriction check and the topic lookup happen under
//! the config controller's lock; the request itself is published outside of
//! it so long-running processes never block configuration changes.

use std::sync::Arc;
use std::time::Duration;

use autoproc_domain::error::{AutoProcError, ExecutionError, RestrictionViolationError};
use autoproc_domain::id::ExecutionId;
use autoproc_domain::naming;
use autoproc_domain::outcome;
use autoproc_domain::restriction::StatefulMessage;

use crate::config_controller::AutomationConfigController;
use crate::ports::{ControlPlane, ExecutionRequest, MessageBroker, SnapshotStore};

/// Source recorded on every request published by the agent.
pub const REQUEST_SOURCE: &str = "autoproc-exec-agent";

/// Executes processes through the message broker.
pub struct ExecutionAgent<CP, SS, B> {
    config: Arc<AutomationConfigController<CP, SS>>,
    broker: Arc<B>,
    default_timeout: Duration,
}

impl<CP, SS, B> Clone for ExecutionAgent<CP, SS, B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            broker: Arc::clone(&self.broker),
            default_timeout: self.default_timeout,
        }
    }
}

impl<CP, SS, B> ExecutionAgent<CP, SS, B>
where
    CP: ControlPlane + Send + Sync,
    SS: SnapshotStore + Send + Sync,
    B: MessageBroker + Send + Sync + 'static,
{
    pub fn new(
        config: Arc<AutomationConfigController<CP, SS>>,
        broker: Arc<B>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            config,
            broker,
            default_timeout,
        }
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `process` with `message` and return its single result.
    ///
    /// `timeout` overrides the agent default. A timed out invocation keeps
    /// running in the control plane; only the caller stops waiting.
    ///
    /// # Errors
    ///
    /// - [`AutoProcError::InvalidProcessType`] for an unknown process
    /// - [`AutoProcError::RestrictionViolation`] when the message state is restricted
    /// - [`ExecutionError::Timeout`] when no completion arrives in time
    /// - [`ExecutionError::Aggregate`] when a procedure failed
    /// - [`ExecutionError::NoResult`] when no procedure produced a result
    /// - [`AutoProcError::Messaging`] for broker failures
    #[tracing::instrument(skip(self, message, timeout), fields(execution_id = tracing::field::Empty))]
    pub async fn execute(
        &self,
        process: &str,
        message: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, AutoProcError> {
        let topic = self
            .config
            .with_exclusive_access(|registry| {
                let process_type = registry.process_type(process)?;
                if !process_type.permits(message.state_ctx()) {
                    return Err(AutoProcError::from(RestrictionViolationError {
                        process: process.to_string(),
                        state: message.state_ctx().unwrap_or_default().to_string(),
                    }));
                }
                Ok(naming::topic(&process_type.name))
            })
            .await?;

        let execution_id = ExecutionId::new();
        tracing::Span::current().record("execution_id", tracing::field::display(execution_id));
        let request = ExecutionRequest {
            execution_id,
            source: REQUEST_SOURCE.to_string(),
            message,
        };

        let broker = Arc::clone(&self.broker);
        let publish = tokio::spawn(async move { broker.publish_request(&topic, request).await });

        let limit = timeout.unwrap_or(self.default_timeout);
        let completion = match tokio::time::timeout(limit, publish).await {
            Ok(Ok(completion)) => completion?,
            Ok(Err(join)) => return Err(AutoProcError::Messaging(Box::new(join))),
            Err(_) => {
                tracing::warn!(%process, timeout_ms = limit.as_millis(), "process timed out");
                return Err(ExecutionError::Timeout {
                    process: process.to_string(),
                    timeout_ms: limit.as_millis(),
                }
                .into());
            }
        };

        if completion.results().count() > 1 {
            tracing::warn!(%process, "several procedures returned a result, using the first one");
        }
        match outcome::aggregate(process, &completion) {
            Ok(result) => {
                tracing::debug!(%process, "process completed");
                Ok(result)
            }
            Err(err) => {
                if let ExecutionError::Aggregate { failures, .. } = &err {
                    for failure in failures {
                        tracing::error!(%process, "{failure}");
                    }
                }
                Err(err.into())
            }
        }
    }
}
