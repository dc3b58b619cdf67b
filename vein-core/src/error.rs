//! Error types for the growth core.
//!
//! Only contract violations are errors. Degenerate geometry (an empty
//! graph, an empty field, opposing attractors) is handled in-band as
//! "no growth this step".

use crate::types::{AttractorId, NodeId};
use thiserror::Error;

/// A configuration value outside its allowed range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("attraction distance must be positive and finite, got {0}")]
    AttractionDistance(f32),
    #[error("kill distance must be positive and finite, got {0}")]
    KillDistance(f32),
    #[error("kill distance {kill} exceeds attraction distance {attraction}")]
    KillExceedsAttraction { kill: f32, attraction: f32 },
    #[error("segment length must be positive and finite, got {0}")]
    SegmentLength(f32),
    #[error("radius range is invalid: minimum {minimum}, maximum {maximum}")]
    RadiusRange { minimum: f32, maximum: f32 },
    #[error("radius increment must be positive and finite, got {0}")]
    RadiusIncrement(f32),
    #[error("jitter must lie in [0, segment length], got {0}")]
    Jitter(f32),
    #[error("invalid json at line {line}, column {column}: {message}")]
    Json {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Errors raised by graph, field and engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrowthError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("unknown attractor id {0}")]
    UnknownAttractor(AttractorId),
    #[error("tree invariant violated: {0}")]
    BrokenInvariant(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = GrowthError> = std::result::Result<T, E>;
