// Submit Use Case (single execution)

use super::constants::EMPTY_NODES_MESSAGE;
use super::{ComputeService, NodeExecution, RoutingView};
use crate::domain::{ClusterNode, JobDescriptor, JobTarget};
use crate::error::{AppError, Result};
use rand::seq::SliceRandom;
use tracing::info;

/// Execute submit use case
///
/// `AnyNode` picks uniformly among the candidates that are currently in the
/// topology. When none of them are, the pick is made from the full set and the
/// execution fails with `NodeLeft`; no other node is tried.
pub async fn execute(
    service: &ComputeService,
    target: &JobTarget,
    job: JobDescriptor,
) -> Result<NodeExecution> {
    job.validate()?;

    let view = service.routing_view();

    let node = match target {
        JobTarget::Node(node) => node.clone(),
        JobTarget::AnyNode(candidates) => pick_candidate(&view, candidates)?,
    };

    info!(job_class = %job.job_class_name, node = %node.id, "Submitting job");

    service.dispatch_one(&view, node, &job).await
}

fn pick_candidate(view: &RoutingView, candidates: &[ClusterNode]) -> Result<ClusterNode> {
    if candidates.is_empty() {
        return Err(AppError::Validation(EMPTY_NODES_MESSAGE.to_string()));
    }

    let alive: Vec<&ClusterNode> = candidates
        .iter()
        .filter(|n| view.members.contains(&n.id))
        .collect();

    let mut rng = rand::thread_rng();
    let picked = if alive.is_empty() {
        candidates.choose(&mut rng)
    } else {
        alive.choose(&mut rng).copied()
    };

    picked
        .cloned()
        .ok_or_else(|| AppError::Internal("no candidate node selected".to_string()))
}
