// Compute Service - submit a job to a target, or broadcast it to many nodes

pub mod broadcast;
pub mod constants;
pub mod execution;
pub mod submit;

#[cfg(test)]
mod broadcast_test;

pub use execution::{BroadcastExecution, NodeExecution};

use crate::domain::{BroadcastJobTarget, ClusterNode, JobDescriptor, JobStatus, JobTarget, NodeId};
use crate::error::Result;
use crate::port::{DispatchRoute, ExecutionError, IdProvider, JobDispatcher, TimeProvider, TopologyProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a broadcast with no target nodes does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyBroadcastPolicy {
    /// Succeed with no executions
    #[default]
    Allow,
    /// Fail with a validation error
    Reject,
}

/// Compute configuration
#[derive(Debug, Clone, Default)]
pub struct ComputeConfig {
    /// Handling of broadcasts whose target selects zero nodes
    pub empty_broadcast: EmptyBroadcastPolicy,

    /// Upper bound on concurrent dispatches per broadcast (None = unbounded).
    /// `Some(0)` is treated as `Some(1)`.
    pub max_parallel_dispatch: Option<usize>,
}

/// Compute Service
pub struct ComputeService {
    topology: Arc<dyn TopologyProvider>,
    dispatcher: Arc<dyn JobDispatcher>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: ComputeConfig,
}

impl ComputeService {
    pub fn new(
        topology: Arc<dyn TopologyProvider>,
        dispatcher: Arc<dyn JobDispatcher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            topology,
            dispatcher,
            id_provider,
            time_provider,
            config: ComputeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ComputeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    /// Run a job once, on the node selected by `target`
    pub async fn submit(&self, target: &JobTarget, job: JobDescriptor) -> Result<NodeExecution> {
        submit::execute(self, target, job).await
    }

    /// Run a job on every node of `target`
    pub async fn broadcast(
        &self,
        target: &BroadcastJobTarget,
        job: JobDescriptor,
    ) -> Result<BroadcastExecution> {
        broadcast::execute(self, target, job).await
    }

    /// Snapshot of the topology used to route one request
    fn routing_view(&self) -> RoutingView {
        RoutingView {
            local: self.topology.local_member().id,
            members: self
                .topology
                .all_members()
                .into_iter()
                .map(|n| n.id)
                .collect(),
        }
    }

    /// Run `job` on a single node and record its status.
    ///
    /// Dispatch failures are captured in the returned record, never propagated.
    async fn dispatch_one(
        &self,
        view: &RoutingView,
        node: ClusterNode,
        job: &JobDescriptor,
    ) -> Result<NodeExecution> {
        let mut status = JobStatus::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
        );

        if !view.members.contains(&node.id) {
            warn!(job_id = %status.id, node = %node.id, "Target node is not in topology");
            status.fail(self.time_provider.now_millis())?;
            let outcome = Err(ExecutionError::NodeLeft(node.id.clone()));
            return Ok(NodeExecution {
                node,
                route: None,
                status,
                outcome,
            });
        }

        let route = if node.id == view.local {
            DispatchRoute::Local
        } else {
            DispatchRoute::Remote
        };

        status.start(self.time_provider.now_millis())?;
        debug!(job_id = %status.id, node = %node.id, route = %route, "Dispatching job");

        let outcome = match route {
            DispatchRoute::Local => self.dispatcher.execute_local(&status.id, job).await,
            DispatchRoute::Remote => {
                self.dispatcher
                    .execute_remote(&node, &status.id, job)
                    .await
            }
        };

        let now = self.time_provider.now_millis();
        match &outcome {
            Ok(_) => status.complete(now)?,
            Err(ExecutionError::Canceled) => status.cancel(now)?,
            Err(e) => {
                warn!(job_id = %status.id, node = %node.id, error = %e, "Job execution failed");
                status.fail(now)?;
            }
        }

        Ok(NodeExecution {
            node,
            route: Some(route),
            status,
            outcome,
        })
    }
}

/// Local node id plus the ids of all current members
struct RoutingView {
    local: NodeId,
    members: HashSet<NodeId>,
}
