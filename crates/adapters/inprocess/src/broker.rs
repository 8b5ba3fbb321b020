//! [`MessageBroker`] implementation delivering requests to message starters.

use autoproc_app::ports::{ExecutionRequest, MessageBroker};
use autoproc_domain::error::AutoProcError;
use autoproc_domain::naming;
use autoproc_domain::outcome::Completion;

use crate::engine::InProcessEngine;
use crate::error::EngineError;

impl MessageBroker for InProcessEngine {
    async fn publish_request(
        &self,
        topic: &str,
        request: ExecutionRequest,
    ) -> Result<Completion, AutoProcError> {
        let starter = self
            .subscriber(topic)
            .ok_or_else(|| EngineError::NoSubscriber {
                topic: topic.to_string(),
            })?;
        let process = naming::process_from_starter(&starter)?;
        tracing::debug!(
            %topic,
            execution_id = %request.execution_id,
            source = %request.source,
            "request delivered"
        );
        Ok(self.run_process(process, &request.message, request.execution_id))
    }
}
