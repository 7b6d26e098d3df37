// Domain Layer - Cluster nodes, job targets and job status

pub mod error;
pub mod job;
pub mod node;
pub mod target;

// Re-exports
pub use error::DomainError;
pub use job::{JobDescriptor, JobId, JobState, JobStatus};
pub use node::{ClusterNode, NodeId};
pub use target::{all_nodes, try_all_nodes, BroadcastJobTarget, BroadcastTargetKind, JobTarget};
