//! Mesh entities: nodes, elements, materials and constraints

mod constraint;
mod element;
mod material;
mod node;

pub use constraint::Constraint;
pub use element::{Element, ElementId, MAX_DISTRIBUTED_LOADS};
pub use material::Material;
pub use node::{Node, NodeId};
