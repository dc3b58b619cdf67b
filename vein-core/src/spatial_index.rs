//! Static k-d tree over node positions.
//!
//! The index is built from a snapshot of [`crate::tree::NodeGraph`]
//! positions and is never updated in place; the engine rebuilds it at the
//! end of every growth step. Point `i` of the snapshot is reported as
//! node id `i`.

use crate::types::NodeId;
use glam::Vec3;

/// Points per leaf bucket.
const LEAF_SIZE: usize = 8;
const NO_CHILD: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct KdNode {
    min: Vec3,
    max: Vec3,
    /// `NO_CHILD` for leaves.
    left: u32,
    right: u32,
    /// Leaf range into `SpatialIndex::order`.
    start: u32,
    end: u32,
    split: f32,
    axis: u8,
}

#[derive(Debug, Default, Clone)]
pub struct SpatialIndex {
    points: Vec<Vec3>,
    order: Vec<NodeId>,
    nodes: Vec<KdNode>,
    root: Option<u32>,
}

impl SpatialIndex {
    pub fn build(points: Vec<Vec3>) -> Self {
        let mut index = Self {
            order: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / LEAF_SIZE + 1),
            points,
            root: None,
        };
        if !index.points.is_empty() {
            let n = index.points.len();
            index.root = Some(index.build_range(0, n));
        }
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn build_range(&mut self, start: usize, end: usize) -> u32 {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &i in &self.order[start..end] {
            min = min.min(self.points[i]);
            max = max.max(self.points[i]);
        }

        let count = end - start;
        if count <= LEAF_SIZE {
            return self.push(KdNode {
                min,
                max,
                left: NO_CHILD,
                right: NO_CHILD,
                start: start as u32,
                end: end as u32,
                split: 0.0,
                axis: 0,
            });
        }

        // Split along the widest extent at the median.
        let extent = max - min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        let points = &self.points;
        let mid = count / 2;
        self.order[start..end].select_nth_unstable_by(mid, |&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        });
        let split = self.points[self.order[start + mid]][axis];

        let left = self.build_range(start, start + mid);
        let right = self.build_range(start + mid, end);
        self.push(KdNode {
            min,
            max,
            left,
            right,
            start: 0,
            end: 0,
            split,
            axis: axis as u8,
        })
    }

    fn push(&mut self, node: KdNode) -> u32 {
        self.nodes.push(node);
        (self.nodes.len() - 1) as u32
    }

    /// Finds the node closest to `query` and its squared distance.
    ///
    /// Returns `None` for an empty index. Exact ties resolve to the lowest
    /// node id, independent of the tree's internal layout.
    pub fn nearest(&self, query: Vec3) -> Option<(NodeId, f32)> {
        let root = self.root?;
        let mut best = (NodeId::MAX, f32::INFINITY);
        let mut stack = vec![root];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx as usize];
            let d2 = box_distance_sq(query, node.min, node.max);
            if d2 > best.1 {
                continue;
            }

            if node.left == NO_CHILD {
                for &id in &self.order[node.start as usize..node.end as usize] {
                    let d2 = self.points[id].distance_squared(query);
                    if d2 < best.1 || (d2 == best.1 && id < best.0) {
                        best = (id, d2);
                    }
                }
                continue;
            }

            // Push the far child first so the near one is searched first.
            let diff = query[node.axis as usize] - node.split;
            if diff <= 0.0 {
                stack.push(node.right);
                stack.push(node.left);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        (best.0 != NodeId::MAX).then_some(best)
    }
}

#[inline]
fn box_distance_sq(p: Vec3, min: Vec3, max: Vec3) -> f32 {
    let clamped = p.clamp(min, max);
    p.distance_squared(clamped)
}
