//! Distributed loads on line elements

use serde::{Deserialize, Serialize};

/// Direction of a distributed load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadDirection {
    /// Along the element axis
    Parallel,
    /// Normal to the element axis (local y)
    Perpendicular,
    /// Global X direction
    GlobalX,
    /// Global Y direction
    GlobalY,
}

/// A linearly varying distributed load over the full element length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Load name
    pub name: String,
    /// Load direction
    pub direction: LoadDirection,
    /// Intensity at the first node (force per unit length)
    pub w1: f64,
    /// Intensity at the second node
    pub w2: f64,
}

impl DistributedLoad {
    /// Create a new distributed load
    pub fn new(name: &str, direction: LoadDirection, w1: f64, w2: f64) -> Self {
        Self {
            name: name.to_string(),
            direction,
            w1,
            w2,
        }
    }

    /// Create a uniform load
    pub fn uniform(name: &str, direction: LoadDirection, w: f64) -> Self {
        Self::new(name, direction, w, w)
    }

    /// Check if the load is uniform (constant magnitude)
    pub fn is_uniform(&self) -> bool {
        (self.w1 - self.w2).abs() < 1e-10
    }

    /// Total force over a given length
    pub fn total_force(&self, length: f64) -> f64 {
        (self.w1 + self.w2) / 2.0 * length
    }

    /// Split the load into local (axial, transverse) intensities for an element
    /// with direction cosines `c`, `s`
    pub fn local_components(&self, c: f64, s: f64) -> [(f64, f64); 2] {
        let (axial, transverse) = match self.direction {
            LoadDirection::Parallel => (1.0, 0.0),
            LoadDirection::Perpendicular => (0.0, 1.0),
            LoadDirection::GlobalX => (c, -s),
            LoadDirection::GlobalY => (s, c),
        };
        [
            (axial * self.w1, axial * self.w2),
            (transverse * self.w1, transverse * self.w2),
        ]
    }
}
