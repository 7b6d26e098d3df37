//! Unit tests for broadcast and submit

use super::*;
use crate::domain::{all_nodes, BroadcastTargetKind, JobState};
use crate::port::id_provider::SequentialIdProvider;
use crate::port::job_dispatcher::mocks::{MockBehavior, RecordingDispatcher};
use crate::port::time_provider::FixedTimeProvider;
use crate::port::topology::MockTopologyProvider;
use crate::port::StaticTopology;
use crate::AppError;
use serde_json::json;

fn node(id: &str) -> ClusterNode {
    ClusterNode::new(id)
}

fn topology() -> Arc<StaticTopology> {
    Arc::new(StaticTopology::new(
        node("local"),
        vec![node("r1"), node("r2")],
    ))
}

fn service(dispatcher: Arc<RecordingDispatcher>) -> ComputeService {
    ComputeService::new(
        topology(),
        dispatcher,
        Arc::new(SequentialIdProvider::new("job")),
        Arc::new(FixedTimeProvider(1000)),
    )
}

fn echo_job() -> JobDescriptor {
    JobDescriptor::new("org.example.EchoJob").with_args(json!({"msg": "hi"}))
}

#[tokio::test]
async fn test_broadcast_runs_on_every_node() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("local"), node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.succeeded(), 3);
    assert_eq!(result.failed(), 0);

    let order: Vec<&str> = result
        .executions()
        .iter()
        .map(|e| e.node.id.as_str())
        .collect();
    assert_eq!(order, vec!["local", "r1", "r2"]);

    let r1 = result.get(&NodeId::new("r1")).unwrap();
    assert_eq!(r1.outcome, Ok(json!({"node": "r1", "args": {"msg": "hi"}})));
    assert_eq!(r1.status.state, JobState::Completed);
    assert_eq!(r1.status.finished_at, Some(1000));
}

#[tokio::test]
async fn test_broadcast_routes_local_member_locally() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = all_nodes(vec![node("r1"), node("local")]);
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(
        result.get(&NodeId::new("local")).unwrap().route,
        Some(DispatchRoute::Local)
    );
    assert_eq!(
        result.get(&NodeId::new("r1")).unwrap().route,
        Some(DispatchRoute::Remote)
    );

    let mut routes: Vec<(DispatchRoute, String)> = dispatcher
        .calls()
        .into_iter()
        .map(|c| (c.route, c.node.to_string()))
        .collect();
    routes.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(
        routes,
        vec![
            (DispatchRoute::Local, "local".to_string()),
            (DispatchRoute::Remote, "r1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_broadcast_empty_target_is_noop_by_default() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());
    assert_eq!(service.config().empty_broadcast, EmptyBroadcastPolicy::Allow);

    let target: BroadcastJobTarget = all_nodes(Vec::new());
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.kind(), BroadcastTargetKind::AllNodes);
    assert!(result.into_executions().is_empty());
    assert_eq!(dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_broadcast_empty_target_rejected_by_config() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone()).with_config(ComputeConfig {
        empty_broadcast: EmptyBroadcastPolicy::Reject,
        ..Default::default()
    });

    let target: BroadcastJobTarget = crate::all_nodes![];
    let result = service.broadcast(&target, echo_job()).await;

    assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("must not be empty")));
    assert_eq!(dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_broadcast_dispatches_duplicates_once() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("r1"), node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(dispatcher.call_count(), 2);
}

#[tokio::test]
async fn test_broadcast_node_outside_topology_fails_without_dispatch() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("r1"), node("gone")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    let gone = result.get(&NodeId::new("gone")).unwrap();
    assert_eq!(gone.outcome, Err(ExecutionError::NodeLeft(NodeId::new("gone"))));
    assert_eq!(gone.status.state, JobState::Failed);
    assert_eq!(gone.route, None);

    assert_eq!(result.succeeded(), 1);
    assert_eq!(dispatcher.call_count(), 1);
}

#[tokio::test]
async fn test_broadcast_one_failure_does_not_affect_others() {
    let dispatcher = Arc::new(
        RecordingDispatcher::new("local")
            .with_behavior("r2", MockBehavior::Fail("boom".to_string())),
    );
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("local"), node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 1);
    let r2 = result.get(&NodeId::new("r2")).unwrap();
    assert_eq!(r2.outcome, Err(ExecutionError::Failed("boom".to_string())));
    assert_eq!(r2.status.state, JobState::Failed);
}

#[tokio::test]
async fn test_broadcast_member_reported_gone_by_dispatcher() {
    let dispatcher = Arc::new(
        RecordingDispatcher::new("local").with_behavior("r1", MockBehavior::NodeLeft),
    );
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("r1"), node("r2")];
    let executions = service
        .broadcast(&target, echo_job())
        .await
        .unwrap()
        .into_executions();

    // r1 is a topology member, so it is dispatched; the dispatcher reports it gone
    assert_eq!(executions[0].route, Some(DispatchRoute::Remote));
    assert_eq!(executions[0].outcome, Err(ExecutionError::NodeLeft(NodeId::new("r1"))));
    assert_eq!(executions[0].status.state, JobState::Failed);
    assert!(executions[0].status.started_at.is_some());
    assert!(executions[1].is_success());
    assert_eq!(dispatcher.call_count(), 2);
}

#[tokio::test]
async fn test_broadcast_assigns_distinct_job_ids() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("local"), node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    let mut ids: Vec<String> = result
        .executions()
        .iter()
        .map(|e| e.status.id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_broadcast_with_parallel_limit() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone()).with_config(ComputeConfig {
        max_parallel_dispatch: Some(1),
        ..Default::default()
    });

    let target = crate::all_nodes![node("local"), node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.succeeded(), 3);
}

#[tokio::test]
async fn test_broadcast_zero_parallel_limit_still_dispatches() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone()).with_config(ComputeConfig {
        max_parallel_dispatch: Some(0),
        ..Default::default()
    });

    let target = crate::all_nodes![node("r1"), node("r2")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.succeeded(), 2);
    assert_eq!(dispatcher.call_count(), 2);
}

#[tokio::test]
async fn test_broadcast_rejects_invalid_job() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::all_nodes![node("r1")];
    let result = service.broadcast(&target, JobDescriptor::new("")).await;

    assert!(matches!(result, Err(AppError::Domain(_))));
    assert_eq!(dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_broadcast_uses_topology_provider() {
    let mut topology = MockTopologyProvider::new();
    topology.expect_local_member().times(1).returning(|| node("a"));
    topology
        .expect_all_members()
        .times(1)
        .returning(|| vec![node("a"), node("b")]);

    let dispatcher = Arc::new(RecordingDispatcher::new("a"));
    let service = ComputeService::new(
        Arc::new(topology),
        dispatcher.clone(),
        Arc::new(SequentialIdProvider::new("job")),
        Arc::new(FixedTimeProvider(0)),
    );

    let target = crate::all_nodes![node("a"), node("b")];
    let result = service.broadcast(&target, echo_job()).await.unwrap();

    assert_eq!(result.succeeded(), 2);
}

#[tokio::test]
async fn test_submit_to_specific_node() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let execution = service
        .submit(&JobTarget::node(node("r2")), echo_job())
        .await
        .unwrap();

    assert!(execution.is_success());
    assert_eq!(execution.node.id, NodeId::new("r2"));
    assert_eq!(dispatcher.calls()[0].node, NodeId::new("r2"));
}

#[tokio::test]
async fn test_submit_any_node_picks_live_candidate() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::any_node![node("gone"), node("r1")];
    for _ in 0..10 {
        let execution = service.submit(&target, echo_job()).await.unwrap();
        assert_eq!(execution.node.id, NodeId::new("r1"));
    }
}

#[tokio::test]
async fn test_submit_any_node_all_gone() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher.clone());

    let target = crate::any_node![node("gone")];
    let execution = service.submit(&target, echo_job()).await.unwrap();

    assert!(!execution.is_success());
    assert!(matches!(execution.outcome, Err(ExecutionError::NodeLeft(_))));
    assert_eq!(dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_submit_any_node_empty_rejected() {
    let dispatcher = Arc::new(RecordingDispatcher::new("local"));
    let service = service(dispatcher);

    let result = service.submit(&JobTarget::any_node(Vec::new()), echo_job()).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}
