//! FElt Solver - a finite element analysis engine
//!
//! The library models a finite element problem (nodes, elements, materials,
//! constraints, forces, distributed loads and load cases), numbers its
//! degrees of freedom, and runs one of:
//! - Linear static analysis, by load case or over a range of one input force
//! - Nonlinear static analysis (substitution or incremental loading)
//! - Steady-state and transient heat conduction
//! - Structural transient analysis (Newmark, fixed or adaptive step)
//! - Modal analysis (generalized eigenproblem, modal matrices)
//! - Spectral analysis (transfer functions and output power spectra)
//!
//! Element formulations are pluggable: a [`definitions::Definition`] names a
//! kernel that computes element matrices, equivalent loads and stresses. The
//! `rod`, `truss`, `beam` and `htk` definitions are registered with every new
//! problem.
//!
//! ## Example
//! ```rust
//! use felt_solver::prelude::*;
//!
//! let mut problem = Problem::new("bar");
//! problem.add_material(Material::elastic("steel", 200e9, 1e-4, 7850.0)).unwrap();
//! problem.add_constraint(Constraint::fixed("fixed")).unwrap();
//! problem.add_force(Force::new("P").with_component(Dof::Tx, 1000.0)).unwrap();
//!
//! problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
//! problem.add_node(2, 1.0, 0.0, 0.0).unwrap();
//! problem.add_element(1, "rod", &[1, 2], "steel").unwrap();
//! problem.constrain_node(1, "fixed").unwrap();
//! problem.apply_force(2, "P").unwrap();
//!
//! let mut sink = TextReporter::new(Vec::new());
//! let output = run(&mut problem, &RunOptions::default(), &mut sink).unwrap();
//! if let AnalysisOutput::Static(results) = output {
//!     let tip = results.displacement(2).unwrap();
//!     assert!((tip.dx - 5e-5).abs() < 1e-12);
//! }
//! ```

pub mod analysis;
pub mod assembly;
pub mod definitions;
pub mod dofs;
pub mod elements;
pub mod error;
pub mod input;
pub mod loads;
pub mod math;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod results;
pub mod solvers;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisParameters, AnalysisType, MassMode};
    pub use crate::definitions::{Definition, Domain};
    pub use crate::dofs::Dof;
    pub use crate::elements::{Constraint, Element, Material, Node};
    pub use crate::error::{FeltError, FeltResult};
    pub use crate::input::{load_model, parse_model, write_model};
    pub use crate::loads::{DistributedLoad, Force, Forcing, LoadCase, LoadDirection};
    pub use crate::model::Problem;
    pub use crate::output::{OutputSink, TextReporter};
    pub use crate::pipeline::{run, AnalysisOutput, RunOptions};
    pub use crate::results::{DofKey, ResultTable, StaticResults};
}
