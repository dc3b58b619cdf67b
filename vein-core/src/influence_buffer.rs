use crate::types::NodeId;
use glam::Vec3;

/// Per-iteration scratch space that accumulates attractor pull per node.
///
/// For each `NodeId` this stores the sum of the unit vectors pointing from
/// the node towards its influencing attractors, plus how many were added.
/// The engine owns one buffer and reuses it across steps.
#[derive(Debug, Default)]
pub struct InfluenceBuffer {
    /// Accumulated unit directions for each node.
    dir: Vec<Vec3>,
    /// Number of contributions for each node.
    count: Vec<u32>,
}

impl InfluenceBuffer {
    pub fn with_len(len: usize) -> Self {
        Self {
            dir: vec![Vec3::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Resizes to `len` entries and clears all of them.
    pub fn ensure_len(&mut self, len: usize) {
        if self.dir.len() != len {
            self.dir.resize(len, Vec3::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.dir.fill(Vec3::ZERO);
        self.count.fill(0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dir.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dir.is_empty()
    }

    /// Adds the pull of an attractor at `target` on the node at `origin`.
    ///
    /// The contribution is the unit vector from `origin` to `target`; an
    /// attractor sitting exactly on the node still counts but adds nothing
    /// to the direction.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: NodeId, origin: Vec3, target: Vec3) {
        self.dir[id] += (target - origin).normalize_or_zero();
        self.count[id] += 1;
    }

    #[inline]
    pub fn count(&self, id: NodeId) -> u32 {
        self.count[id]
    }

    /// Unit growth direction for a node, or `None` when the node has no
    /// influence or its contributions cancel out.
    #[inline]
    pub fn growth_dir(&self, id: NodeId) -> Option<Vec3> {
        if self.count[id] == 0 {
            return None;
        }
        self.dir[id].try_normalize()
    }

    #[inline]
    pub fn is_influenced(&self, id: NodeId) -> bool {
        self.count[id] > 0
    }

    /// Node ids with at least one contribution, in ascending order.
    pub fn influenced_indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.count
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c > 0 { Some(i) } else { None })
    }
}
