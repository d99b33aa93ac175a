//! Load cases

use std::sync::Arc;

use super::{DistributedLoad, Force};
use crate::elements::{ElementId, NodeId};

/// A load case replaces the problem's nodal forces and element loads with its
/// own set when the case is solved
#[derive(Debug, Clone)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    /// Nodal forces applied in this case
    pub forces: Vec<(NodeId, Arc<Force>)>,
    /// Element loads applied in this case
    pub loads: Vec<(ElementId, Arc<DistributedLoad>)>,
}

impl LoadCase {
    /// Create an empty load case
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            forces: Vec::new(),
            loads: Vec::new(),
        }
    }

    /// Loads of this case that act on one element
    pub fn element_loads(&self, element: ElementId) -> Vec<Arc<DistributedLoad>> {
        self.loads
            .iter()
            .filter(|(id, _)| *id == element)
            .map(|(_, load)| Arc::clone(load))
            .collect()
    }
}
