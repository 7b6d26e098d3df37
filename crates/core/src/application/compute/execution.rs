// Execution records returned by the compute service

use crate::domain::{BroadcastTargetKind, ClusterNode, JobState, JobStatus, NodeId};
use crate::port::{DispatchRoute, ExecutionError};

/// Result of running a job on one node
#[derive(Debug, Clone)]
pub struct NodeExecution {
    pub node: ClusterNode,
    /// `None` when the job was never dispatched (node not in topology)
    pub route: Option<DispatchRoute>,
    pub status: JobStatus,
    pub outcome: Result<serde_json::Value, ExecutionError>,
}

impl NodeExecution {
    pub fn is_success(&self) -> bool {
        self.status.state == JobState::Completed
    }
}

/// Per-node results of a broadcast, in target order
#[derive(Debug, Clone)]
pub struct BroadcastExecution {
    kind: BroadcastTargetKind,
    executions: Vec<NodeExecution>,
}

impl BroadcastExecution {
    pub(crate) fn new(kind: BroadcastTargetKind, executions: Vec<NodeExecution>) -> Self {
        Self { kind, executions }
    }

    pub fn kind(&self) -> BroadcastTargetKind {
        self.kind
    }

    pub fn executions(&self) -> &[NodeExecution] {
        &self.executions
    }

    pub fn into_executions(self) -> Vec<NodeExecution> {
        self.executions
    }

    pub fn get(&self, node: &NodeId) -> Option<&NodeExecution> {
        self.executions.iter().find(|e| &e.node.id == node)
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.executions.iter().filter(|e| e.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.executions.len() - self.succeeded()
    }
}
