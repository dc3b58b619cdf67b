use crate::{
    attractor::AttractorField,
    config::Config,
    containment::ContainmentOracle,
    error::Result,
    influence_buffer::InfluenceBuffer,
    phases::{self, StagedNode},
    spatial_index::SpatialIndex,
    tree::NodeGraph,
    types::{AttractorId, NodeId, ObstacleId},
};
use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

/// What one call to [`GrowthEngine::step`] did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepReport {
    /// 1-based number of the step just completed.
    pub iteration: u64,
    /// Attractors associated with a node during this step.
    pub associated: usize,
    pub new_nodes: Vec<NodeId>,
    /// Growth candidates refused by the containment oracle.
    pub rejected: usize,
    /// Influenced nodes skipped because their pulls cancelled out.
    pub degenerate: usize,
    pub removed_attractors: Vec<AttractorId>,
}

impl StepReport {
    /// True when the step changed neither the graph nor the field.
    pub fn is_idle(&self) -> bool {
        self.new_nodes.is_empty() && self.removed_attractors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    IterationLimit,
    FieldExhausted,
    /// Nothing can change any more: no growth, no removals and no aging.
    Stalled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub nodes_grown: usize,
    pub attractors_removed: usize,
    pub reason: StopReason,
}

/// Drives the space-colonization simulation one step at a time.
///
/// The engine owns the node graph, the attractor field, the spatial index
/// over nodes, and the scratch buffers reused between steps. It is
/// single-threaded; independent trees need independent engines.
#[derive(Debug)]
pub struct GrowthEngine {
    cfg: Config,
    graph: NodeGraph,
    attractors: AttractorField,
    index: SpatialIndex,
    obstacles: Vec<ObstacleId>,

    acc: InfluenceBuffer,
    staged: Vec<StagedNode>,
    rng: StdRng,

    iteration: u64,
}

impl GrowthEngine {
    /// Creates an engine with an empty graph and field.
    ///
    /// ### Errors
    /// Returns [`crate::error::GrowthError::Config`] if `cfg` fails
    /// [`Config::validate`].
    pub fn new(cfg: Config) -> Result<Self> {
        Self::with_state(cfg, NodeGraph::new(), AttractorField::new())
    }

    /// Creates an engine around an existing graph and field and indexes the
    /// graph immediately.
    pub fn with_state(cfg: Config, graph: NodeGraph, attractors: AttractorField) -> Result<Self> {
        cfg.validate()?;
        let index = SpatialIndex::build(graph.snapshot_positions());
        Ok(Self {
            rng: StdRng::seed_from_u64(cfg.jitter_seed),
            cfg,
            graph,
            attractors,
            index,
            obstacles: Vec::new(),
            acc: InfluenceBuffer::default(),
            staged: Vec::new(),
            iteration: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn attractors(&self) -> &AttractorField {
        &self.attractors
    }

    /// Number of completed steps.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Seeds a root node with the minimum radius.
    pub fn add_root(&mut self, pos: Vec3) -> NodeId {
        let id = self.graph.add_root(pos, self.cfg.minimum_radius);
        self.reindex();
        id
    }

    pub fn add_attractor(&mut self, pos: Vec3) -> AttractorId {
        if self.cfg.enable_attractor_aging {
            self.attractors.insert(pos)
        } else {
            self.attractors.insert_with_age(pos, None)
        }
    }

    pub fn add_attractors(&mut self, positions: impl IntoIterator<Item = Vec3>) -> Vec<AttractorId> {
        positions.into_iter().map(|p| self.add_attractor(p)).collect()
    }

    /// Replaces the set of obstacles checked when obstacles are enabled.
    pub fn set_active_obstacles(&mut self, obstacles: impl IntoIterator<Item = ObstacleId>) {
        self.obstacles = obstacles.into_iter().collect();
    }

    pub fn active_obstacles(&self) -> &[ObstacleId] {
        &self.obstacles
    }

    fn reindex(&mut self) {
        self.index = SpatialIndex::build(self.graph.snapshot_positions());
    }

    /// Runs one full iteration: associate, grow, prune, reindex.
    ///
    /// An empty graph or field is not an error; the step simply does nothing
    /// besides aging attractors.
    pub fn step(&mut self, oracle: &impl ContainmentOracle) -> Result<StepReport> {
        let associated = phases::attraction_phase(
            &mut self.graph,
            &mut self.attractors,
            &self.index,
            &self.cfg,
            &mut self.acc,
        )?;

        let growth = phases::growth_phase(
            &mut self.graph,
            &self.acc,
            &self.cfg,
            oracle,
            &self.obstacles,
            &mut self.rng,
            &mut self.staged,
        )?;

        let removed = phases::prune_phase(&mut self.attractors, &self.cfg);

        self.reindex();
        self.iteration += 1;

        debug!(
            iteration = self.iteration,
            associated,
            grown = growth.new_ids.len(),
            rejected = growth.rejected,
            degenerate = growth.degenerate,
            removed = removed.len(),
            nodes = self.graph.len(),
            attractors = self.attractors.len(),
            "growth step complete"
        );

        Ok(StepReport {
            iteration: self.iteration,
            associated,
            new_nodes: growth.new_ids,
            rejected: growth.rejected,
            degenerate: growth.degenerate,
            removed_attractors: removed,
        })
    }

    /// Steps until `max_iterations` steps have run, the field is empty, or
    /// a step changes nothing while aging is off and no jittered candidate
    /// was rejected.
    pub fn run(&mut self, oracle: &impl ContainmentOracle, max_iterations: u64) -> Result<RunSummary> {
        if self.graph.is_empty() {
            warn!("running growth without any root nodes");
        }

        let mut summary = RunSummary {
            steps: 0,
            nodes_grown: 0,
            attractors_removed: 0,
            reason: StopReason::IterationLimit,
        };

        while summary.steps < max_iterations {
            if self.attractors.is_empty() {
                summary.reason = StopReason::FieldExhausted;
                break;
            }
            let report = self.step(oracle)?;
            summary.steps += 1;
            summary.nodes_grown += report.new_nodes.len();
            summary.attractors_removed += report.removed_attractors.len();

            // Jitter gives rejected candidates a new position next step.
            let may_retry = self.cfg.jitter > 0.0 && report.rejected > 0;
            if report.is_idle() && !self.cfg.enable_attractor_aging && !may_retry {
                summary.reason = StopReason::Stalled;
                break;
            }
        }
        if summary.reason == StopReason::IterationLimit && self.attractors.is_empty() {
            summary.reason = StopReason::FieldExhausted;
        }

        info!(
            steps = summary.steps,
            nodes_grown = summary.nodes_grown,
            attractors_removed = summary.attractors_removed,
            reason = ?summary.reason,
            "growth run stopped"
        );
        Ok(summary)
    }
}
