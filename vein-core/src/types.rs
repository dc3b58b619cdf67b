/// Identifier for a node in a [`crate::tree::NodeGraph`].
///
/// This is an index into `NodeGraph::nodes`. Nodes are never removed during
/// a run, so an id stays valid for the lifetime of the graph that issued it.
pub type NodeId = usize;

/// Identifier for an attractor in a [`crate::attractor::AttractorField`].
///
/// Assigned on insertion from a monotonically increasing counter and never
/// reused, even after the attractor has been consumed.
pub type AttractorId = u64;

/// Identifier for an obstacle known to a [`crate::containment::ContainmentOracle`].
pub type ObstacleId = usize;
