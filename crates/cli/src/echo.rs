//! In-process dispatcher that answers every job with an echo of its input.
//!
//! Stands in for the network transport so targets and broadcasts can be tried
//! against a topology file without a running cluster.

use async_trait::async_trait;
use gridcast_core::domain::{ClusterNode, JobDescriptor, JobId, NodeId};
use gridcast_core::port::{ExecutionError, JobDispatcher};
use serde_json::json;
use tracing::debug;

pub struct EchoDispatcher {
    local: NodeId,
}

impl EchoDispatcher {
    pub fn new(local: NodeId) -> Self {
        Self { local }
    }

    fn echo(&self, node: &NodeId, job_id: &JobId, job: &JobDescriptor) -> serde_json::Value {
        debug!(job_id = %job_id, node = %node, "Echoing job");
        json!({
            "node": node.as_str(),
            "job": job.job_class_name,
            "args": job.args,
        })
    }
}

#[async_trait]
impl JobDispatcher for EchoDispatcher {
    async fn execute_local(
        &self,
        job_id: &JobId,
        job: &JobDescriptor,
    ) -> Result<serde_json::Value, ExecutionError> {
        Ok(self.echo(&self.local, job_id, job))
    }

    async fn execute_remote(
        &self,
        node: &ClusterNode,
        job_id: &JobId,
        job: &JobDescriptor,
    ) -> Result<serde_json::Value, ExecutionError> {
        Ok(self.echo(&node.id, job_id, job))
    }
}
