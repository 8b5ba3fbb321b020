//! Message broker port — request/reply transport to the control plane.

use std::future::Future;

use autoproc_domain::error::AutoProcError;
use autoproc_domain::id::ExecutionId;
use autoproc_domain::outcome::Completion;

/// Request to run a process, published on the process topic.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub execution_id: ExecutionId,
    /// Component issuing the request.
    pub source: String,
    pub message: serde_json::Value,
}

/// Publishes execution requests and awaits the starter completion.
pub trait MessageBroker {
    /// Publish `request` on `topic` and resolve once every activated
    /// procedure has reported its outcome.
    fn publish_request(
        &self,
        topic: &str,
        request: ExecutionRequest,
    ) -> impl Future<Output = Result<Completion, AutoProcError>> + Send;
}
