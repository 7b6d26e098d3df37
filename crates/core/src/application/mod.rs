// Application Layer - Use Cases

pub mod compute;

// Re-exports
pub use compute::{
    BroadcastExecution, ComputeConfig, ComputeService, EmptyBroadcastPolicy, NodeExecution,
};
