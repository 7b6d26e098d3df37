// Job Target Domain Model
//
// Targets only name nodes. Whether a node is alive, local or remote is decided
// by the compute service at dispatch time.

use crate::domain::error::{DomainError, Result};
use crate::domain::node::ClusterNode;
use std::fmt;
use std::sync::Arc;

/// Variant tag of a [`BroadcastJobTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastTargetKind {
    AllNodes,
}

impl fmt::Display for BroadcastTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastTargetKind::AllNodes => write!(f, "ALL_NODES"),
        }
    }
}

/// Broadcast job target: the set of nodes a job is fanned out to.
///
/// The node sequence is snapshotted at construction into a shared immutable
/// slice, so later changes to the caller's collection are never observed and
/// clones share the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BroadcastJobTarget<N = ClusterNode> {
    /// Run the job on every listed node
    AllNodes(Arc<[N]>),
}

impl<N> BroadcastJobTarget<N> {
    pub fn kind(&self) -> BroadcastTargetKind {
        match self {
            BroadcastJobTarget::AllNodes(_) => BroadcastTargetKind::AllNodes,
        }
    }

    /// Wrapped node sequence, in construction order
    pub fn data(&self) -> &[N] {
        match self {
            BroadcastJobTarget::AllNodes(nodes) => nodes,
        }
    }

    pub fn nodes(&self) -> &[N] {
        self.data()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.data().iter()
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

impl<'a, N> IntoIterator for &'a BroadcastJobTarget<N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Create a broadcast target for all specified nodes.
///
/// An empty sequence is accepted; the submitting side decides whether an
/// empty broadcast is an error. Duplicates are kept as given.
pub fn all_nodes<N, I>(nodes: I) -> BroadcastJobTarget<N>
where
    I: IntoIterator<Item = N>,
{
    BroadcastJobTarget::AllNodes(nodes.into_iter().collect())
}

/// Same as [`all_nodes`] for inputs that may be absent.
///
/// # Errors
/// `DomainError::InvalidArgument` when `nodes` is `None`
pub fn try_all_nodes<N, I>(nodes: Option<I>) -> Result<BroadcastJobTarget<N>>
where
    I: IntoIterator<Item = N>,
{
    nodes
        .map(all_nodes)
        .ok_or_else(|| DomainError::null_argument("nodes"))
}

/// Variadic form of [`all_nodes`]: `all_nodes![a, b, c]`
#[macro_export]
macro_rules! all_nodes {
    ($($node:expr),* $(,)?) => {
        $crate::domain::target::all_nodes(::std::vec![$($node),*])
    };
}

/// Target for a single job execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTarget {
    /// Run on exactly this node
    Node(ClusterNode),
    /// Run on one node picked from the set
    AnyNode(Arc<[ClusterNode]>),
}

impl JobTarget {
    pub fn node(node: ClusterNode) -> Self {
        JobTarget::Node(node)
    }

    pub fn any_node<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = ClusterNode>,
    {
        JobTarget::AnyNode(nodes.into_iter().collect())
    }

    /// # Errors
    /// `DomainError::InvalidArgument` when `nodes` is `None`
    pub fn try_any_node<I>(nodes: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = ClusterNode>,
    {
        nodes
            .map(Self::any_node)
            .ok_or_else(|| DomainError::null_argument("nodes"))
    }

    /// Candidate nodes (one element for `Node`)
    pub fn candidates(&self) -> &[ClusterNode] {
        match self {
            JobTarget::Node(node) => std::slice::from_ref(node),
            JobTarget::AnyNode(nodes) => nodes,
        }
    }
}

/// Variadic form of [`JobTarget::any_node`]: `any_node![a, b]`
#[macro_export]
macro_rules! any_node {
    ($($node:expr),* $(,)?) => {
        $crate::domain::target::JobTarget::any_node(::std::vec![$($node),*])
    };
}
