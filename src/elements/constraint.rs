//! Constraint templates (supports, boundary values and initial conditions)

use serde::{Deserialize, Serialize};

use crate::dofs::Dof;

/// A named constraint template shared by any number of nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraint {
    /// Constraint name
    pub name: String,
    /// Restrained flags indexed by [`Dof::index`]
    pub restrained: [bool; 6],
    /// Prescribed value of each restrained DOF
    pub boundary: [f64; 6],
    /// Initial displacement (or temperature) for transient analysis
    pub initial_displacement: [f64; 6],
    /// Initial velocity for transient analysis
    pub initial_velocity: [f64; 6],
}

impl Constraint {
    /// Create a constraint with no restraints
    pub fn free(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Create a fully fixed constraint (all DOFs restrained at zero)
    pub fn fixed(name: &str) -> Self {
        Self {
            restrained: [true; 6],
            ..Self::free(name)
        }
    }

    /// Create a pinned constraint (translations restrained, rotations free)
    pub fn pinned(name: &str) -> Self {
        Self {
            restrained: [true, true, true, false, false, false],
            ..Self::free(name)
        }
    }

    /// Restrain a single DOF at zero
    pub fn with_restraint(mut self, dof: Dof) -> Self {
        self.restrained[dof.index()] = true;
        self
    }

    /// Restrain a DOF at a prescribed value
    pub fn with_boundary(mut self, dof: Dof, value: f64) -> Self {
        self.restrained[dof.index()] = true;
        self.boundary[dof.index()] = value;
        self
    }

    /// Set the initial displacement of a DOF
    pub fn with_initial_displacement(mut self, dof: Dof, value: f64) -> Self {
        self.initial_displacement[dof.index()] = value;
        self
    }

    /// Set the initial velocity of a DOF
    pub fn with_initial_velocity(mut self, dof: Dof, value: f64) -> Self {
        self.initial_velocity[dof.index()] = value;
        self
    }

    /// Whether a DOF is restrained
    pub fn is_restrained(&self, dof: Dof) -> bool {
        self.restrained[dof.index()]
    }

    /// Prescribed value of a restrained DOF
    pub fn boundary_value(&self, dof: Dof) -> f64 {
        self.boundary[dof.index()]
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.restrained.iter().filter(|&&r| r).count()
    }
}
