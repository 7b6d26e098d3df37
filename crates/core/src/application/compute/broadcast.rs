// Broadcast Use Case

use super::constants::EMPTY_NODES_MESSAGE;
use super::{BroadcastExecution, ComputeService, EmptyBroadcastPolicy};
use crate::domain::{BroadcastJobTarget, ClusterNode, JobDescriptor};
use crate::error::{AppError, Result};
use futures::future::join_all;
use std::collections::HashSet;
use tokio::sync::Semaphore;
use tracing::info;

/// Execute broadcast use case
///
/// Every distinct node of the target gets its own job id and execution record.
/// Per-node failures land in the records; `Err` is only returned when the
/// request itself is invalid.
///
/// # Arguments
///
/// * `service` - Compute service holding the ports
/// * `target` - Nodes to fan out to
/// * `job` - Job to run on each node
pub async fn execute(
    service: &ComputeService,
    target: &BroadcastJobTarget,
    job: JobDescriptor,
) -> Result<BroadcastExecution> {
    job.validate()?;

    let nodes = match target {
        BroadcastJobTarget::AllNodes(nodes) => distinct_nodes(nodes),
    };

    if nodes.is_empty() {
        match service.config.empty_broadcast {
            EmptyBroadcastPolicy::Reject => {
                return Err(AppError::Validation(EMPTY_NODES_MESSAGE.to_string()))
            }
            EmptyBroadcastPolicy::Allow => {
                info!(job_class = %job.job_class_name, "Empty broadcast, nothing to run");
                return Ok(BroadcastExecution::new(target.kind(), Vec::new()));
            }
        }
    }

    info!(
        job_class = %job.job_class_name,
        kind = %target.kind(),
        nodes = nodes.len(),
        "Broadcasting job"
    );

    let view = service.routing_view();
    let limiter = service
        .config
        .max_parallel_dispatch
        .map(|n| Semaphore::new(n.max(1)));

    let runs = nodes.into_iter().map(|node| {
        let view = &view;
        let job = &job;
        let limiter = limiter.as_ref();
        async move {
            let _permit = match limiter {
                Some(sem) => Some(
                    sem.acquire()
                        .await
                        .map_err(|e| AppError::Internal(e.to_string()))?,
                ),
                None => None,
            };
            service.dispatch_one(view, node, job).await
        }
    });

    let executions = join_all(runs)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let result = BroadcastExecution::new(target.kind(), executions);

    info!(
        job_class = %job.job_class_name,
        succeeded = result.succeeded(),
        failed = result.failed(),
        "Broadcast finished"
    );

    Ok(result)
}

/// Drop repeated node ids, keeping the first occurrence's position
fn distinct_nodes(nodes: &[ClusterNode]) -> Vec<ClusterNode> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|n| seen.insert(&n.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_nodes_keeps_first_occurrence() {
        let nodes = vec![
            ClusterNode::new("b"),
            ClusterNode::new("a"),
            ClusterNode::new("b").with_name("again"),
        ];

        let distinct = distinct_nodes(&nodes);

        assert_eq!(distinct, vec![ClusterNode::new("b"), ClusterNode::new("a")]);
        assert_eq!(distinct[0].name, "b");
    }
}
