//! Node - a numbered point of the mesh

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Constraint;
use crate::loads::Force;

/// Index of a node inside [`crate::model::Problem::nodes`]
pub type NodeId = usize;

/// A node of the finite element mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node number (identity, never changed by renumbering)
    pub number: u32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,

    /// Assigned constraint (`None` means unconstrained)
    #[serde(skip)]
    pub constraint: Option<Arc<Constraint>>,

    /// Assigned nodal force
    #[serde(skip)]
    pub force: Option<Arc<Force>>,

    /// Position of this node in the global equation numbering
    #[serde(skip)]
    pub(crate) eq_position: usize,

    /// Solved nodal values [Tx, Ty, Tz, Rx, Ry, Rz]
    #[serde(skip)]
    pub(crate) values: [f64; 6],
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(number: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            number,
            x,
            y,
            z,
            constraint: None,
            force: None,
            eq_position: 0,
            values: [0.0; 6],
        }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        crate::math::distance(&self.coords(), &other.coords())
    }

    /// Position of the node in the current equation numbering
    pub fn eq_position(&self) -> usize {
        self.eq_position
    }

    /// Nodal values from the last solve [Tx, Ty, Tz, Rx, Ry, Rz]
    pub fn values(&self) -> [f64; 6] {
        self.values
    }
}
