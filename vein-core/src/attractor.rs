use crate::{
    error::{GrowthError, Result},
    types::{AttractorId, NodeId},
};
use glam::Vec3;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    pub id: AttractorId,
    pub pos: Vec3,
    /// Node this attractor pulled on during the current iteration.
    ///
    /// Under open venation an attractor influences at most its single
    /// nearest node, so this is the whole "is influencing" set.
    pub owner: Option<NodeId>,
    /// Set during association when the nearest node lies within kill distance.
    pub reached: bool,
    /// Iterations since creation. `None` means this attractor never ages out.
    pub age: Option<u32>,
}

impl Attractor {
    #[inline]
    pub fn is_expired(&self, max_age: u32) -> bool {
        self.age.is_some_and(|age| age > max_age)
    }
}

/// The live attraction points, kept in ascending id order.
#[derive(Debug, Default, Clone)]
pub struct AttractorField {
    points: Vec<Attractor>,
    next_id: AttractorId,
}

impl AttractorField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let mut set = Self::new();
        for pos in positions {
            set.insert(pos);
        }
        set
    }

    /// Inserts an attractor that starts aging at zero.
    pub fn insert(&mut self, pos: Vec3) -> AttractorId {
        self.insert_with_age(pos, Some(0))
    }

    /// Inserts an attractor with an explicit initial age; `None` disables
    /// aging for this point.
    pub fn insert_with_age(&mut self, pos: Vec3, age: Option<u32>) -> AttractorId {
        let id = self.next_id;
        self.next_id += 1;
        self.points.push(Attractor {
            id,
            pos,
            owner: None,
            reached: false,
            age,
        });
        id
    }

    /// Uniformly samples `count` points inside a sphere.
    pub fn random_in_sphere(count: usize, center: Vec3, radius: f32, rng: &mut impl Rng) -> Self {
        let positions: Vec<Vec3> = (0..count)
            .map(|_| {
                // Rejection sampling in the bounding cube.
                loop {
                    let p = Vec3::new(
                        rng.random_range(-1.0..=1.0),
                        rng.random_range(-1.0..=1.0),
                        rng.random_range(-1.0..=1.0),
                    );
                    if p.length_squared() <= 1.0 {
                        break center + p * radius;
                    }
                }
            })
            .collect();

        Self::from_positions(positions)
    }

    /// Uniform points in the box `[-h, h]` per axis, where `h` is the
    /// absolute value of `half_extent`.
    pub fn random_in_box(count: usize, half_extent: Vec3, rng: &mut impl Rng) -> Self {
        let h = half_extent.abs();
        let positions: Vec<Vec3> = (0..count)
            .map(|_| {
                let x = rng.random_range(-h.x..=h.x);
                let y = rng.random_range(-h.y..=h.y);
                let z = rng.random_range(-h.z..=h.z);
                Vec3::new(x, y, z)
            })
            .collect();

        Self::from_positions(positions)
    }

    /// A planar grid in the XY plane with every point displaced by up to half
    /// a cell in x and y.
    pub fn jittered_grid(rows: usize, cols: usize, spacing: f32, rng: &mut impl Rng) -> Self {
        let half = spacing * 0.5;
        let mut positions = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let dx = if half > 0.0 { rng.random_range(-half..half) } else { 0.0 };
                let dy = if half > 0.0 { rng.random_range(-half..half) } else { 0.0 };
                positions.push(Vec3::new(
                    col as f32 * spacing + dx,
                    row as f32 * spacing + dy,
                    0.0,
                ));
            }
        }

        Self::from_positions(positions)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attractor> {
        self.points.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attractor> {
        self.points.iter_mut()
    }

    fn slot(&self, id: AttractorId) -> Option<usize> {
        self.points.binary_search_by_key(&id, |a| a.id).ok()
    }

    pub fn get(&self, id: AttractorId) -> Result<&Attractor> {
        self.slot(id)
            .map(|i| &self.points[i])
            .ok_or(GrowthError::UnknownAttractor(id))
    }

    pub fn contains(&self, id: AttractorId) -> bool {
        self.slot(id).is_some()
    }

    /// Clears the per-iteration owner and reached flags on every attractor.
    pub fn reset_influence(&mut self) {
        for a in &mut self.points {
            a.owner = None;
            a.reached = false;
        }
    }

    pub fn mark_reached(&mut self, id: AttractorId, reached: bool) -> Result<()> {
        let i = self.slot(id).ok_or(GrowthError::UnknownAttractor(id))?;
        self.points[i].reached = reached;
        Ok(())
    }

    /// Ages every attractor by one iteration (when aging is enabled) and
    /// returns the ids that should be removed: reached ones, plus expired
    /// ones when aging is enabled. Nothing is removed here.
    pub fn age_and_collect_expired(&mut self, max_age: u32, aging_enabled: bool) -> Vec<AttractorId> {
        let mut expired = Vec::new();
        for a in &mut self.points {
            if aging_enabled && let Some(age) = a.age.as_mut() {
                *age = age.saturating_add(1);
            }
            if a.reached || (aging_enabled && a.is_expired(max_age)) {
                expired.push(a.id);
            }
        }
        expired
    }

    /// Removes the given attractors. Ids that are already absent are ignored.
    pub fn remove(&mut self, ids: &[AttractorId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let doomed: HashSet<AttractorId> = ids.iter().copied().collect();
        let before = self.points.len();
        self.points.retain(|a| !doomed.contains(&a.id));
        before - self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut set = AttractorField::from_positions(vec![Vec3::ZERO, Vec3::X]);
        assert_eq!(set.iter().map(|a| a.id).collect::<Vec<_>>(), vec![0, 1]);

        set.remove(&[1]);
        let id = set.insert(Vec3::Y);
        assert_eq!(id, 2);
        assert!(!set.contains(1));
        assert_eq!(set.get(2).unwrap().pos, Vec3::Y);
    }

    #[test]
    fn reset_influence_clears_owner_and_reached() {
        let mut set = AttractorField::from_positions(vec![Vec3::ZERO]);
        set.mark_reached(0, true).unwrap();
        set.iter_mut().for_each(|a| a.owner = Some(3));

        set.reset_influence();

        let a = set.get(0).unwrap();
        assert!(!a.reached);
        assert_eq!(a.owner, None);
    }

    #[test]
    fn mark_reached_on_unknown_id_fails() {
        let mut set = AttractorField::new();
        assert_eq!(
            set.mark_reached(9, true),
            Err(GrowthError::UnknownAttractor(9))
        );
    }

    #[test]
    fn age_and_collect_expired_reports_reached_and_old_points() {
        let mut set = AttractorField::new();
        let fresh = set.insert(Vec3::ZERO);
        let old = set.insert_with_age(Vec3::X, Some(3));
        let ageless = set.insert_with_age(Vec3::Y, None);
        let reached = set.insert(Vec3::Z);
        set.mark_reached(reached, true).unwrap();

        let expired = set.age_and_collect_expired(3, true);

        assert_eq!(expired, vec![old, reached]);
        assert_eq!(set.get(fresh).unwrap().age, Some(1));
        assert_eq!(set.get(old).unwrap().age, Some(4));
        assert_eq!(set.get(ageless).unwrap().age, None);
        // Collection does not remove anything.
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn aging_disabled_leaves_ages_untouched() {
        let mut set = AttractorField::new();
        let id = set.insert_with_age(Vec3::ZERO, Some(50));

        let expired = set.age_and_collect_expired(10, false);

        assert!(expired.is_empty());
        assert_eq!(set.get(id).unwrap().age, Some(50));
    }

    #[test]
    fn remove_is_idempotent_and_order_independent() {
        let mut set = AttractorField::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);

        assert_eq!(set.remove(&[2, 0, 2]), 2);
        assert_eq!(set.remove(&[0, 2]), 0);
        assert_eq!(set.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn random_generators_respect_their_volumes() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = Vec3::new(10.0, -5.0, 2.0);

        let sphere = AttractorField::random_in_sphere(200, center, 3.0, &mut rng);
        assert_eq!(sphere.len(), 200);
        assert!(sphere.iter().all(|a| a.pos.distance(center) <= 3.0 + 1e-4));

        let half = Vec3::new(1.0, 2.0, 0.5);
        let cube = AttractorField::random_in_box(100, half, &mut rng);
        assert!(cube.iter().all(|a| a.pos.abs().cmple(half).all()));

        let flipped = AttractorField::random_in_box(50, -half, &mut rng);
        assert_eq!(flipped.len(), 50);
        assert!(flipped.iter().all(|a| a.pos.abs().cmple(half).all()));

        let grid = AttractorField::jittered_grid(4, 5, 2.0, &mut rng);
        assert_eq!(grid.len(), 20);
        assert!(grid.iter().all(|a| a.pos.z == 0.0));
    }
}
