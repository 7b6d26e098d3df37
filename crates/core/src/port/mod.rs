// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod job_dispatcher;
pub mod time_provider;
pub mod topology;

// Re-exports
pub use id_provider::IdProvider;
pub use job_dispatcher::{DispatchRoute, ExecutionError, JobDispatcher};
pub use time_provider::TimeProvider;
pub use topology::{StaticTopology, TopologyProvider, TopologySnapshot};
