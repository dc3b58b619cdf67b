//! The individual phases of one growth step.
//!
//! [`crate::engine::GrowthEngine::step`] runs them in this order:
//! 1. [`attraction_phase`] — every live attractor is associated with its
//!    single nearest node when within attraction distance, and flagged as
//!    reached when within kill distance.
//! 2. [`growth_phase`] — every influenced node proposes one new node along
//!    its averaged pull; accepted candidates are inserted after the scan.
//! 3. [`prune_phase`] — reached and expired attractors are removed.
//!
//! The spatial index is rebuilt by the engine afterwards.

use crate::{
    attractor::AttractorField,
    config::Config,
    containment::ContainmentOracle,
    error::Result,
    influence_buffer::InfluenceBuffer,
    spatial_index::SpatialIndex,
    tree::NodeGraph,
    types::{AttractorId, NodeId, ObstacleId},
};
use glam::Vec3;
use rand::Rng;
use tracing::trace;

/// A growth candidate accepted during the scan but not yet inserted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedNode {
    pub parent: NodeId,
    pub pos: Vec3,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GrowthOutcome {
    /// Ids of inserted nodes, in insertion order.
    pub new_ids: Vec<NodeId>,
    /// Candidates refused by the containment oracle.
    pub rejected: usize,
    /// Influenced nodes whose pulls cancelled out.
    pub degenerate: usize,
}

/// Associates attractors with their nearest node.
///
/// Clears last iteration's influence state on both the graph and the field,
/// then for each attractor queries `index`. Within `cfg.attraction_distance`
/// the attractor is recorded in the node's `influenced_by` and its pull is
/// added to `acc`; `reached` is set when within `cfg.kill_distance`.
///
/// `index` must have been built from `graph.snapshot_positions()`.
///
/// ### Returns
/// The number of attractors associated with some node.
pub fn attraction_phase(
    graph: &mut NodeGraph,
    attractors: &mut AttractorField,
    index: &SpatialIndex,
    cfg: &Config,
    acc: &mut InfluenceBuffer,
) -> Result<usize> {
    let attract2 = cfg.attraction_distance_sq();
    let kill2 = cfg.kill_distance_sq();

    graph.clear_influence();
    attractors.reset_influence();
    acc.ensure_len(graph.len());

    let mut associated = 0;
    for a in attractors.iter_mut() {
        let Some((id, d2)) = index.nearest(a.pos) else {
            continue;
        };
        if d2 > attract2 {
            continue;
        }
        let node = graph.get_mut(id)?;
        node.influenced_by.push(a.id);
        acc.add(id, node.pos, a.pos);
        a.owner = Some(id);
        a.reached = d2 <= kill2;
        associated += 1;
    }
    Ok(associated)
}

/// Grows one new node from every influenced node.
///
/// Candidates are placed `cfg.segment_length` along the node's growth
/// direction, offset by up to `cfg.jitter` per axis when jitter is on. A
/// candidate is dropped when bounds checking is on and it lies outside the
/// bounds, or when obstacle checking is on and it lies inside any of
/// `obstacles`. Accepted candidates go to `staged` and are only inserted
/// once every node has been visited, so nodes created here cannot grow
/// again within the same step. Each insertion is followed by canalization
/// when enabled.
pub fn growth_phase(
    graph: &mut NodeGraph,
    acc: &InfluenceBuffer,
    cfg: &Config,
    oracle: &impl ContainmentOracle,
    obstacles: &[ObstacleId],
    rng: &mut impl Rng,
    staged: &mut Vec<StagedNode>,
) -> Result<GrowthOutcome> {
    let mut outcome = GrowthOutcome::default();
    staged.clear();

    for id in acc.influenced_indices() {
        let Some(dir) = acc.growth_dir(id) else {
            trace!(node = id, "influence cancels out, skipping growth");
            outcome.degenerate += 1;
            continue;
        };

        let mut pos = graph.get(id)?.pos + dir * cfg.segment_length;
        if cfg.jitter > 0.0 {
            let j = cfg.jitter;
            pos += Vec3::new(
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
            );
        }

        if !is_admissible(pos, cfg, oracle, obstacles) {
            trace!(node = id, ?pos, "growth candidate rejected by containment");
            outcome.rejected += 1;
            continue;
        }

        staged.push(StagedNode { parent: id, pos });
    }

    outcome.new_ids.reserve(staged.len());
    for s in staged.iter() {
        let new_id = graph.add_node(s.pos, Some(s.parent), cfg.minimum_radius)?;
        if cfg.enable_canalization {
            graph.thicken(new_id, cfg.radius_increment, cfg.maximum_radius)?;
        }
        outcome.new_ids.push(new_id);
    }
    Ok(outcome)
}

fn is_admissible(
    pos: Vec3,
    cfg: &Config,
    oracle: &impl ContainmentOracle,
    obstacles: &[ObstacleId],
) -> bool {
    if cfg.bounds_enabled && !oracle.inside_bounds(pos) {
        return false;
    }
    if cfg.obstacles_enabled && obstacles.iter().any(|&o| oracle.inside_obstacle(pos, o)) {
        return false;
    }
    true
}

/// Ages the field and removes reached or expired attractors.
///
/// ### Returns
/// The ids of the removed attractors.
pub fn prune_phase(attractors: &mut AttractorField, cfg: &Config) -> Vec<AttractorId> {
    let doomed =
        attractors.age_and_collect_expired(cfg.max_attractor_age, cfg.enable_attractor_aging);
    attractors.remove(&doomed);
    doomed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::{Shape, ShapeOracle, Unbounded};
    use rand::{SeedableRng, rngs::StdRng};

    fn cfg() -> Config {
        Config {
            attraction_distance: 2.0,
            kill_distance: 0.5,
            segment_length: 1.0,
            minimum_radius: 0.1,
            maximum_radius: 1.0,
            radius_increment: 0.1,
            ..Config::default()
        }
    }

    fn single_root() -> (NodeGraph, SpatialIndex) {
        let mut graph = NodeGraph::new();
        graph.add_root(Vec3::ZERO, 0.1);
        let index = SpatialIndex::build(graph.snapshot_positions());
        (graph, index)
    }

    #[test]
    fn attraction_phase_associates_nearest_node_and_sets_owner() {
        let (mut graph, index) = single_root();
        let mut attractors = AttractorField::from_positions(vec![Vec3::X]);
        let mut acc = InfluenceBuffer::default();

        let n = attraction_phase(&mut graph, &mut attractors, &index, &cfg(), &mut acc).unwrap();

        assert_eq!(n, 1);
        assert_eq!(acc.len(), graph.len());
        assert_eq!(acc.growth_dir(0), Some(Vec3::X));
        assert_eq!(graph.get(0).unwrap().influenced_by, vec![0]);
        let a = attractors.get(0).unwrap();
        assert_eq!(a.owner, Some(0));
        assert!(!a.reached);
    }

    #[test]
    fn attraction_phase_flags_reached_within_kill_distance() {
        let (mut graph, index) = single_root();
        let mut attractors = AttractorField::from_positions(vec![Vec3::new(0.0, 0.4, 0.0)]);
        let mut acc = InfluenceBuffer::default();

        attraction_phase(&mut graph, &mut attractors, &index, &cfg(), &mut acc).unwrap();

        assert!(attractors.get(0).unwrap().reached);
    }

    #[test]
    fn attraction_phase_ignores_attractors_outside_radius() {
        let (mut graph, index) = single_root();
        let mut attractors = AttractorField::from_positions(vec![Vec3::new(100.0, 0.0, 0.0)]);
        let mut acc = InfluenceBuffer::default();

        let n = attraction_phase(&mut graph, &mut attractors, &index, &cfg(), &mut acc).unwrap();

        assert_eq!(n, 0);
        assert!(!acc.is_influenced(0));
        assert_eq!(attractors.get(0).unwrap().owner, None);
    }

    #[test]
    fn attraction_phase_only_influences_the_nearest_node() {
        let mut graph = NodeGraph::new();
        let near = graph.add_root(Vec3::ZERO, 0.1);
        let far = graph.add_root(Vec3::new(1.5, 0.0, 0.0), 0.1);
        let index = SpatialIndex::build(graph.snapshot_positions());
        // Within range of both roots, closer to `near`.
        let mut attractors = AttractorField::from_positions(vec![Vec3::new(0.7, 0.0, 0.0)]);
        let mut acc = InfluenceBuffer::default();

        attraction_phase(&mut graph, &mut attractors, &index, &cfg(), &mut acc).unwrap();

        assert!(acc.is_influenced(near));
        assert!(!acc.is_influenced(far));
    }

    #[test]
    fn attraction_phase_on_empty_graph_is_a_no_op() {
        let mut graph = NodeGraph::new();
        let index = SpatialIndex::build(Vec::new());
        let mut attractors = AttractorField::from_positions(vec![Vec3::ZERO]);
        let mut acc = InfluenceBuffer::default();

        let n = attraction_phase(&mut graph, &mut attractors, &index, &cfg(), &mut acc).unwrap();

        assert_eq!(n, 0);
        assert_eq!(attractors.len(), 1);
    }

    #[test]
    fn growth_phase_creates_child_in_influence_direction() {
        let (mut graph, _) = single_root();
        let mut acc = InfluenceBuffer::with_len(1);
        acc.add(0, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));
        let mut staged = Vec::new();
        let mut rng = StdRng::seed_from_u64(0);

        let out = growth_phase(&mut graph, &acc, &cfg(), &Unbounded, &[], &mut rng, &mut staged)
            .unwrap();

        assert_eq!(out.new_ids, vec![1]);
        let child = graph.get(1).unwrap();
        assert_eq!(child.pos, Vec3::X);
        assert_eq!(child.radius, 0.1);
        assert!(!graph.get(0).unwrap().is_tip);
        // Canalization thickened the root.
        assert!((graph.get(0).unwrap().radius - 0.2).abs() < 1e-6);
    }

    #[test]
    fn growth_phase_without_canalization_keeps_radii() {
        let (mut graph, _) = single_root();
        let mut acc = InfluenceBuffer::with_len(1);
        acc.add(0, Vec3::ZERO, Vec3::Y);
        let cfg = Config {
            enable_canalization: false,
            ..cfg()
        };
        let mut rng = StdRng::seed_from_u64(0);

        growth_phase(&mut graph, &acc, &cfg, &Unbounded, &[], &mut rng, &mut Vec::new()).unwrap();

        assert_eq!(graph.get(0).unwrap().radius, 0.1);
    }

    #[test]
    fn growth_phase_skips_cancelled_influence() {
        let (mut graph, _) = single_root();
        let mut acc = InfluenceBuffer::with_len(1);
        acc.add(0, Vec3::ZERO, Vec3::Z);
        acc.add(0, Vec3::ZERO, -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(0);

        let out = growth_phase(&mut graph, &acc, &cfg(), &Unbounded, &[], &mut rng, &mut Vec::new())
            .unwrap();

        assert!(out.new_ids.is_empty());
        assert_eq!(out.degenerate, 1);
        assert_eq!(graph.len(), 1);
        assert!(graph.get(0).unwrap().is_tip);
    }

    #[test]
    fn growth_phase_rejects_candidates_outside_bounds_or_inside_obstacles() {
        let mut graph = NodeGraph::new();
        graph.add_root(Vec3::ZERO, 0.1);
        graph.add_root(Vec3::new(10.0, 0.0, 0.0), 0.1);
        let mut acc = InfluenceBuffer::with_len(2);
        acc.add(0, Vec3::ZERO, Vec3::X);
        acc.add(1, Vec3::new(10.0, 0.0, 0.0), Vec3::new(11.0, 0.0, 0.0));

        let mut oracle = ShapeOracle::new(Some(Shape::Sphere {
            center: Vec3::ZERO,
            radius: 5.0,
        }));
        let block = oracle.add_obstacle(Shape::Sphere {
            center: Vec3::X,
            radius: 0.2,
        });
        let cfg = Config {
            bounds_enabled: true,
            obstacles_enabled: true,
            ..cfg()
        };
        let mut rng = StdRng::seed_from_u64(0);

        let out = growth_phase(&mut graph, &acc, &cfg, &oracle, &[block], &mut rng, &mut Vec::new())
            .unwrap();

        assert!(out.new_ids.is_empty());
        assert_eq!(out.rejected, 2);
        assert_eq!(graph.len(), 2);
        assert!(graph.tips().count() == 2);
    }

    #[test]
    fn disabled_checks_do_not_consult_the_oracle() {
        let (mut graph, _) = single_root();
        let mut acc = InfluenceBuffer::with_len(1);
        acc.add(0, Vec3::ZERO, Vec3::X);
        let oracle = ShapeOracle::new(Some(Shape::Sphere {
            center: Vec3::splat(100.0),
            radius: 1.0,
        }));
        let mut rng = StdRng::seed_from_u64(0);

        let out = growth_phase(&mut graph, &acc, &cfg(), &oracle, &[], &mut rng, &mut Vec::new())
            .unwrap();

        assert_eq!(out.new_ids.len(), 1);
    }

    #[test]
    fn jitter_stays_within_configured_offset() {
        let (mut graph, _) = single_root();
        let mut acc = InfluenceBuffer::with_len(1);
        acc.add(0, Vec3::ZERO, Vec3::X);
        let cfg = Config {
            jitter: 0.25,
            ..cfg()
        };
        let mut rng = StdRng::seed_from_u64(3);

        growth_phase(&mut graph, &acc, &cfg, &Unbounded, &[], &mut rng, &mut Vec::new()).unwrap();

        let offset = graph.get(1).unwrap().pos - Vec3::X;
        assert!(offset.abs().max_element() <= 0.25);
    }

    #[test]
    fn prune_phase_removes_reached_attractors_only() {
        let mut attractors = AttractorField::from_positions(vec![Vec3::ZERO, Vec3::X]);
        attractors.mark_reached(1, true).unwrap();

        let removed = prune_phase(&mut attractors, &cfg());

        assert_eq!(removed, vec![1]);
        assert_eq!(attractors.len(), 1);
        assert!(attractors.contains(0));
    }

    #[test]
    fn prune_phase_expires_old_attractors_when_aging() {
        let mut attractors = AttractorField::new();
        attractors.insert_with_age(Vec3::ZERO, Some(2));
        attractors.insert_with_age(Vec3::X, None);
        let cfg = Config {
            enable_attractor_aging: true,
            max_attractor_age: 2,
            ..cfg()
        };

        let removed = prune_phase(&mut attractors, &cfg);

        assert_eq!(removed, vec![0]);
        assert!(attractors.contains(1));
    }
}
