//! Core 3-D space-colonization growth library for vein-like networks.
//!
//! Main components:
//! - [`attractor`] — attraction points with per-iteration and aging state.
//! - [`tree`] — the node arena and canalization.
//! - [`spatial_index`] — k-d tree answering nearest-node queries.
//! - [`influence_buffer`] — per-iteration accumulated pull per node.
//! - [`containment`] — bounds/obstacle queries consumed by growth.
//! - [`phases`] — the attraction, growth and prune phases of a step.
//! - [`engine`] — the step-driven simulation owning all of the above.
//! - [`topology`] — branch and patch extraction for tube meshing.
//! - [`config`] — algorithm parameters and their validation.
//! - [`error`] — error types.
//! - [`types`] — shared type aliases and IDs.
//!
//! A typical run seeds roots and attractors, then steps:
//!
//! ```
//! use glam::Vec3;
//! use vein_core::{Config, GrowthEngine, TopologyWalker, containment::Unbounded};
//!
//! let mut engine = GrowthEngine::new(Config::default())?;
//! engine.add_root(Vec3::ZERO);
//! engine.add_attractors([Vec3::new(40.0, 0.0, 0.0), Vec3::new(0.0, 40.0, 0.0)]);
//! engine.run(&Unbounded, 50)?;
//!
//! let geometry = TopologyWalker::new(engine.graph()).geometry();
//! assert!(!geometry.branches.is_empty());
//! # Ok::<(), vein_core::GrowthError>(())
//! ```

pub mod attractor;
pub mod config;
pub mod containment;
pub mod engine;
pub mod error;
pub mod influence_buffer;
pub mod phases;
pub mod spatial_index;
pub mod topology;
pub mod tree;
pub mod types;

pub use attractor::{Attractor, AttractorField};
pub use config::Config;
pub use containment::ContainmentOracle;
pub use engine::{GrowthEngine, RunSummary, StepReport, StopReason};
pub use error::{ConfigError, GrowthError};
pub use spatial_index::SpatialIndex;
pub use topology::{Branch, Geometry, Polyline, TopologyWalker};
pub use tree::{NodeGraph, VeinNode};
pub use types::{AttractorId, NodeId, ObstacleId};
