// Compute constants (no magic values)

/// Error message for an empty any-node target (or a rejected empty broadcast)
pub const EMPTY_NODES_MESSAGE: &str = "nodes must not be empty";
