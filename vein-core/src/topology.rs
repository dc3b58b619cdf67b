//! Decomposition of a [`NodeGraph`] into mesher-ready polylines.
//!
//! Branches are maximal runs of single-child nodes. A branch that starts
//! below a branching node is prefixed with that branching node's parent
//! (or the branching node itself when it is a root), so consecutive tubes
//! overlap at the joint. Patches are three-point fans
//! `[previous, branching, child]` filling the gap at every branching node.
//!
//! Both walks use an explicit stack, so arbitrarily deep trees are safe.

use crate::{tree::NodeGraph, types::NodeId};
use glam::Vec3;
use serde::Serialize;

/// A polyline with one radius per vertex.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub nodes: Vec<NodeId>,
    pub points: Vec<Vec3>,
    pub radii: Vec<f32>,
}

impl Polyline {
    fn with_capacity(n: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(n),
            points: Vec::with_capacity(n),
            radii: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, graph: &NodeGraph, id: NodeId) {
        // Ids come from the graph's own links.
        let n = &graph.nodes()[id];
        self.nodes.push(id);
        self.points.push(n.pos);
        self.radii.push(n.radius);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Branch {
    /// Upstream node prepended as the first vertex, if any.
    pub anchor: Option<NodeId>,
    pub line: Polyline,
}

impl Branch {
    /// The nodes this branch owns, without the leading anchor.
    pub fn members(&self) -> &[NodeId] {
        let skip = usize::from(self.anchor.is_some());
        &self.line.nodes[skip..]
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub branches: Vec<Branch>,
    pub patches: Vec<Polyline>,
}

pub struct TopologyWalker<'a> {
    graph: &'a NodeGraph,
}

impl<'a> TopologyWalker<'a> {
    pub fn new(graph: &'a NodeGraph) -> Self {
        Self { graph }
    }

    /// Upstream neighbour used for joint overlap: the parent, or the node
    /// itself for a root.
    fn previous(&self, id: NodeId) -> NodeId {
        self.graph.nodes()[id].parent.unwrap_or(id)
    }

    pub fn branches(&self) -> Vec<Branch> {
        let nodes = self.graph.nodes();
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, Option<NodeId>)> =
            self.graph.roots().iter().rev().map(|&r| (r, None)).collect();

        while let Some((start, anchor)) = stack.pop() {
            let mut line = Polyline::with_capacity(8);
            if let Some(a) = anchor {
                line.push(self.graph, a);
            }

            let mut cur = start;
            loop {
                line.push(self.graph, cur);
                match nodes[cur].children.as_slice() {
                    [] => break,
                    [only] => cur = *only,
                    children => {
                        let joint = self.previous(cur);
                        stack.extend(children.iter().rev().map(|&c| (c, Some(joint))));
                        break;
                    }
                }
            }
            out.push(Branch { anchor, line });
        }
        out
    }

    pub fn patches(&self) -> Vec<Polyline> {
        let nodes = self.graph.nodes();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.graph.roots().iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let children = &nodes[id].children;
            if children.len() > 1 {
                let prev = self.previous(id);
                for &c in children {
                    let mut fan = Polyline::with_capacity(3);
                    fan.push(self.graph, prev);
                    fan.push(self.graph, id);
                    fan.push(self.graph, c);
                    out.push(fan);
                }
            }
            stack.extend(children.iter().rev());
        }
        out
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            branches: self.branches(),
            patches: self.patches(),
        }
    }
}
