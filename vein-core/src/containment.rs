//! Containment queries consumed by the growth step.
//!
//! The engine never inspects scene geometry itself. It asks a
//! [`ContainmentOracle`] whether a growth candidate lies inside the growth
//! volume and whether it lies inside any active obstacle. Hosts back this
//! with their own collision system; [`ShapeOracle`] covers simple analytic
//! volumes.

use crate::types::ObstacleId;
use glam::Vec3;

pub trait ContainmentOracle {
    /// Whether `point` lies inside the growth volume.
    fn inside_bounds(&self, point: Vec3) -> bool;

    /// Whether `point` lies inside obstacle `obstacle`.
    fn inside_obstacle(&self, point: Vec3, obstacle: ObstacleId) -> bool;
}

/// Accepts every point: unbounded space without obstacles.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl ContainmentOracle for Unbounded {
    fn inside_bounds(&self, _point: Vec3) -> bool {
        true
    }

    fn inside_obstacle(&self, _point: Vec3, _obstacle: ObstacleId) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Shape {
    pub fn contains(&self, p: Vec3) -> bool {
        match *self {
            Shape::Sphere { center, radius } => p.distance_squared(center) <= radius * radius,
            Shape::Aabb { min, max } => p.cmpge(min).all() && p.cmple(max).all(),
        }
    }
}

/// Oracle over analytic shapes. Obstacle ids index into `obstacles`.
///
/// Without a bounds shape every point counts as inside bounds; an unknown
/// obstacle id contains nothing.
#[derive(Debug, Default, Clone)]
pub struct ShapeOracle {
    pub bounds: Option<Shape>,
    pub obstacles: Vec<Shape>,
}

impl ShapeOracle {
    pub fn new(bounds: Option<Shape>) -> Self {
        Self {
            bounds,
            obstacles: Vec::new(),
        }
    }

    pub fn add_obstacle(&mut self, shape: Shape) -> ObstacleId {
        self.obstacles.push(shape);
        self.obstacles.len() - 1
    }
}

impl ContainmentOracle for ShapeOracle {
    fn inside_bounds(&self, point: Vec3) -> bool {
        self.bounds.is_none_or(|b| b.contains(point))
    }

    fn inside_obstacle(&self, point: Vec3, obstacle: ObstacleId) -> bool {
        self.obstacles
            .get(obstacle)
            .is_some_and(|s| s.contains(point))
    }
}
