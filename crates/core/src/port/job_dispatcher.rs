// Job Dispatcher Port
// Abstraction over where a job physically runs (this process or a remote node)

use crate::domain::{ClusterNode, JobDescriptor, JobId, NodeId};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Per-node execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Node {0} has left the cluster")]
    NodeLeft(NodeId),

    #[error("Job class not found: {0}")]
    ClassNotFound(String),

    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job canceled")]
    Canceled,
}

/// Which side of the dispatcher handled a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchRoute {
    Local,
    Remote,
}

impl std::fmt::Display for DispatchRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchRoute::Local => write!(f, "LOCAL"),
            DispatchRoute::Remote => write!(f, "REMOTE"),
        }
    }
}

/// Job Dispatcher trait
///
/// Implementations:
/// - in-process echo dispatcher (CLI)
/// - network transport to remote workers (outside this crate)
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Run the job in this process
    ///
    /// # Errors
    /// - ExecutionError::ClassNotFound if the job class is not deployed
    /// - ExecutionError::Failed if the job itself failed
    async fn execute_local(
        &self,
        job_id: &JobId,
        job: &JobDescriptor,
    ) -> Result<serde_json::Value, ExecutionError>;

    /// Send the job to `node` and wait for its result
    ///
    /// # Errors
    /// - ExecutionError::NodeLeft if the node is unreachable
    /// - same as `execute_local` for failures on the node
    async fn execute_remote(
        &self,
        node: &ClusterNode,
        job_id: &JobId,
        job: &JobDescriptor,
    ) -> Result<serde_json::Value, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock dispatcher behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return `{"node": <id>, "args": <job args>}`
        Echo,
        /// Fail with message
        Fail(String),
        /// Report the node as gone
        NodeLeft,
    }

    /// A dispatch observed by [`RecordingDispatcher`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCall {
        pub route: DispatchRoute,
        pub node: NodeId,
        pub job_id: JobId,
    }

    /// Mock dispatcher that records every call.
    ///
    /// Local calls are recorded against the `local` node id given at creation.
    pub struct RecordingDispatcher {
        local: NodeId,
        default_behavior: MockBehavior,
        behaviors: Arc<Mutex<HashMap<NodeId, MockBehavior>>>,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl RecordingDispatcher {
        pub fn new(local: impl Into<NodeId>) -> Self {
            Self {
                local: local.into(),
                default_behavior: MockBehavior::Echo,
                behaviors: Arc::new(Mutex::new(HashMap::new())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_behavior(self, node: impl Into<NodeId>, behavior: MockBehavior) -> Self {
            self.behaviors.lock().unwrap().insert(node.into(), behavior);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn run(
            &self,
            route: DispatchRoute,
            node: &NodeId,
            job_id: &JobId,
            job: &JobDescriptor,
        ) -> Result<serde_json::Value, ExecutionError> {
            self.calls.lock().unwrap().push(RecordedCall {
                route,
                node: node.clone(),
                job_id: job_id.clone(),
            });

            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(node)
                .cloned()
                .unwrap_or_else(|| self.default_behavior.clone());

            match behavior {
                MockBehavior::Echo => Ok(serde_json::json!({
                    "node": node.as_str(),
                    "args": job.args,
                })),
                MockBehavior::Fail(msg) => Err(ExecutionError::Failed(msg)),
                MockBehavior::NodeLeft => Err(ExecutionError::NodeLeft(node.clone())),
            }
        }
    }

    #[async_trait]
    impl JobDispatcher for RecordingDispatcher {
        async fn execute_local(
            &self,
            job_id: &JobId,
            job: &JobDescriptor,
        ) -> Result<serde_json::Value, ExecutionError> {
            self.run(DispatchRoute::Local, &self.local, job_id, job)
        }

        async fn execute_remote(
            &self,
            node: &ClusterNode,
            job_id: &JobId,
            job: &JobDescriptor,
        ) -> Result<serde_json::Value, ExecutionError> {
            self.run(DispatchRoute::Remote, &node.id, job_id, job)
        }
    }
}
