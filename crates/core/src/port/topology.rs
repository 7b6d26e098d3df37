// Topology Port
// Cluster membership is owned elsewhere; the compute layer only reads it.

use crate::domain::{ClusterNode, NodeId};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Read-only view of the current cluster topology
#[cfg_attr(test, mockall::automock)]
pub trait TopologyProvider: Send + Sync {
    /// The node this process runs on
    fn local_member(&self) -> ClusterNode;

    /// All nodes currently in the topology (local member included)
    fn all_members(&self) -> Vec<ClusterNode>;

    /// Look up a member by id
    fn member(&self, id: &NodeId) -> Option<ClusterNode> {
        self.all_members().into_iter().find(|n| &n.id == id)
    }
}

/// Serialized topology: `{"local": "<node id>", "members": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub local: NodeId,
    pub members: Vec<ClusterNode>,
}

/// Fixed topology, e.g. loaded from a file
#[derive(Debug, Clone)]
pub struct StaticTopology {
    local: ClusterNode,
    members: Vec<ClusterNode>,
}

impl StaticTopology {
    pub fn new(local: ClusterNode, mut members: Vec<ClusterNode>) -> Self {
        if !members.contains(&local) {
            members.insert(0, local.clone());
        }
        Self { local, members }
    }

    /// Build from a snapshot whose `local` id must be one of the members
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = snapshot.members.iter().find(|n| !seen.insert(&n.id)) {
            return Err(AppError::Config(format!(
                "duplicate member id in topology: {}",
                dup.id
            )));
        }

        let local = snapshot
            .members
            .iter()
            .find(|n| n.id == snapshot.local)
            .cloned()
            .ok_or_else(|| {
                AppError::Config(format!(
                    "local node '{}' is not a topology member",
                    snapshot.local
                ))
            })?;

        Ok(Self {
            local,
            members: snapshot.members,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: TopologySnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

impl TopologyProvider for StaticTopology {
    fn local_member(&self) -> ClusterNode {
        self.local.clone()
    }

    fn all_members(&self) -> Vec<ClusterNode> {
        self.members.clone()
    }
}
