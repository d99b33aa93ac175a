//! Element - a finite element bound to a registered definition

use std::sync::Arc;

use super::{Material, NodeId};
use crate::definitions::Definition;
use crate::loads::DistributedLoad;

/// Index of an element inside [`crate::model::Problem::elements`]
pub type ElementId = usize;

/// Maximum number of distributed loads an element can carry
pub const MAX_DISTRIBUTED_LOADS: usize = 3;

/// A finite element of the mesh
#[derive(Debug, Clone)]
pub struct Element {
    /// Element number (identity)
    pub number: u32,
    /// Element formulation
    pub definition: Arc<Definition>,
    /// Member nodes in definition order
    pub nodes: Vec<NodeId>,
    /// Shared material
    pub material: Arc<Material>,
    /// Applied distributed loads (at most [`MAX_DISTRIBUTED_LOADS`])
    pub loads: Vec<Arc<DistributedLoad>>,

    /// Element stresses from the last static solve
    pub(crate) stresses: Vec<f64>,
}

impl Element {
    /// Create an element; node count and material are checked by the problem
    pub fn new(
        number: u32,
        definition: Arc<Definition>,
        nodes: Vec<NodeId>,
        material: Arc<Material>,
    ) -> Self {
        Self {
            number,
            definition,
            nodes,
            material,
            loads: Vec::new(),
            stresses: Vec::new(),
        }
    }

    /// Stress results from the last static solve
    pub fn stresses(&self) -> &[f64] {
        &self.stresses
    }

    /// Number of equations contributed by this element
    pub fn num_element_dofs(&self) -> usize {
        self.nodes.len() * self.definition.dofs.len()
    }
}
