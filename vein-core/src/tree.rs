use crate::{
    error::{GrowthError, Result},
    types::{AttractorId, NodeId},
};
use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct VeinNode {
    pub id: NodeId,
    pub pos: Vec3,
    pub radius: f32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// True until this node spawns its first child.
    pub is_tip: bool,
    /// Attractors whose nearest node is this one in the current iteration.
    pub influenced_by: Vec<AttractorId>,
}

/// Arena of vein nodes forming a forest, one tree per root.
///
/// Parent and child links are plain ids into the arena. Nodes are only ever
/// appended, so a child's id is always greater than its parent's.
#[derive(Debug, Default, Clone)]
pub struct NodeGraph {
    nodes: Vec<VeinNode>,
    roots: Vec<NodeId>,
}

impl VeinNode {
    fn new(id: NodeId, pos: Vec3, radius: f32, parent: Option<NodeId>) -> Self {
        Self {
            id,
            pos,
            radius,
            parent,
            children: Vec::with_capacity(4),
            is_tip: true,
            influenced_by: Vec::new(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, pos: Vec3, radius: f32) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(VeinNode::new(id, pos, radius, None));
        self.roots.push(id);
        id
    }

    /// Appends a node, linking it under `parent` when one is given.
    ///
    /// The parent stops being a tip. Fails without modifying the graph if
    /// `parent` does not exist.
    pub fn add_node(&mut self, pos: Vec3, parent: Option<NodeId>, radius: f32) -> Result<NodeId> {
        let Some(parent) = parent else {
            return Ok(self.add_root(pos, radius));
        };
        let id = self.nodes.len();
        let p = self
            .nodes
            .get_mut(parent)
            .ok_or(GrowthError::UnknownNode(parent))?;
        p.children.push(id);
        p.is_tip = false;
        self.nodes.push(VeinNode::new(id, pos, radius, Some(parent)));
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Result<&VeinNode> {
        self.nodes.get(id).ok_or(GrowthError::UnknownNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut VeinNode> {
        self.nodes.get_mut(id).ok_or(GrowthError::UnknownNode(id))
    }

    /// All nodes, indexed by id.
    pub fn nodes(&self) -> &[VeinNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &VeinNode> {
        self.nodes.iter()
    }

    pub fn tips(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.is_tip).map(|n| n.id)
    }

    /// Number of edges between `id` and its root.
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        let mut depth = 0;
        let mut cur = self.get(id)?;
        while let Some(p) = cur.parent {
            cur = self.get(p)?;
            depth += 1;
        }
        Ok(depth)
    }

    pub fn clear_influence(&mut self) {
        for n in &mut self.nodes {
            n.influenced_by.clear();
        }
    }

    /// Canalization: adds `increment` to the radius of every ancestor of
    /// `start`, clamped to `max_radius`. `start` itself is left unchanged.
    pub fn thicken(&mut self, start: NodeId, increment: f32, max_radius: f32) -> Result<()> {
        let mut next = self.get(start)?.parent;
        while let Some(id) = next {
            let node = self.get_mut(id)?;
            if node.radius < max_radius {
                node.radius = (node.radius + increment).min(max_radius);
            }
            next = node.parent;
        }
        Ok(())
    }

    /// Node positions in id order, so index `i` of the snapshot is node `i`.
    pub fn snapshot_positions(&self) -> Vec<Vec3> {
        self.nodes.iter().map(|n| n.pos).collect()
    }

    /// Verifies the forest, tip and radius invariants, reporting the first
    /// violation found.
    pub fn check_invariants(&self, max_radius: f32) -> Result<()> {
        let broken = |msg: String| Err(GrowthError::BrokenInvariant(msg));
        let mut seen_as_child = vec![false; self.nodes.len()];

        for (i, n) in self.nodes.iter().enumerate() {
            if n.id != i {
                return broken(format!("node at slot {i} carries id {}", n.id));
            }
            if n.radius > max_radius {
                return broken(format!("node {i} radius {} exceeds {max_radius}", n.radius));
            }
            if n.is_tip != n.children.is_empty() {
                return broken(format!(
                    "node {i} is_tip={} with {} children",
                    n.is_tip,
                    n.children.len()
                ));
            }
            match n.parent {
                None if !self.roots.contains(&i) => {
                    return broken(format!("parentless node {i} is not a registered root"));
                }
                Some(p) if p >= i => {
                    return broken(format!("node {i} has parent {p} created after it"));
                }
                Some(p) => {
                    let siblings = &self.nodes[p].children;
                    let count = siblings.iter().filter(|&&c| c == i).count();
                    if count != 1 {
                        return broken(format!("parent {p} lists node {i} {count} times"));
                    }
                }
                None => {}
            }
            for &c in &n.children {
                let Some(child) = self.nodes.get(c) else {
                    return broken(format!("node {i} lists missing child {c}"));
                };
                if child.parent != Some(i) {
                    return broken(format!("child {c} of {i} points at {:?}", child.parent));
                }
                if std::mem::replace(&mut seen_as_child[c], true) {
                    return broken(format!("node {c} is listed as a child twice"));
                }
            }
        }
        Ok(())
    }
}
