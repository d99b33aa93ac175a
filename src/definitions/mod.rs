//! Element definitions and the name-keyed definition registry
//!
//! A [`Definition`] describes an element formulation by its capabilities:
//! node count, DOF signature, analysis domain and an [`ElementKernel`] that
//! computes element matrices. Assembly and the analysis pipeline only ever
//! talk to these capabilities, so installing a new formulation is a matter of
//! registering another definition.

mod beam;
mod htk;
mod rod;
mod truss;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use beam::BeamKernel;
pub use htk::HeatTriangleKernel;
pub use rod::RodKernel;
pub use truss::TrussKernel;

use crate::analysis::MassMode;
use crate::dofs::Dof;
use crate::elements::Material;
use crate::error::{FeltError, FeltResult};
use crate::loads::DistributedLoad;
use crate::math::{Mat, Vec as FEVec};

/// Physical domain an element formulation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Structural,
    Thermal,
}

/// Everything a kernel needs to know about one element
#[derive(Debug)]
pub struct ElementContext<'a> {
    /// Element number, used in diagnostics
    pub number: u32,
    /// Node coordinates in definition order
    pub coords: Vec<[f64; 3]>,
    pub material: &'a Material,
    pub loads: &'a [Arc<DistributedLoad>],
    /// Current nodal values in element DOF order (nonlinear stiffness only)
    pub displacement: Option<&'a [f64]>,
}

impl ElementContext<'_> {
    /// Build the error reported for this element
    pub fn invalid(&self, message: impl Into<String>) -> FeltError {
        FeltError::InvalidElement {
            element: self.number,
            message: message.into(),
        }
    }

    /// Length and direction cosines of a two-node element
    pub fn axis(&self) -> FeltResult<(f64, [f64; 3])> {
        let [a, b] = [self.coords[0], self.coords[1]];
        let length = crate::math::distance(&a, &b);
        if length < 1e-12 {
            return Err(self.invalid("element has zero length"));
        }
        let cosines = [
            (b[0] - a[0]) / length,
            (b[1] - a[1]) / length,
            (b[2] - a[2]) / length,
        ];
        Ok((length, cosines))
    }

    /// Fail unless a material property is positive
    pub fn require(&self, property: &str, value: f64) -> FeltResult<f64> {
        if value > 0.0 {
            Ok(value)
        } else {
            Err(self.invalid(format!(
                "material {} has no {} defined",
                self.material.name, property
            )))
        }
    }
}

/// Element matrices of one formulation
///
/// Matrices and vectors use the element DOF layout: for each node in order,
/// the definition's DOFs in order.
pub trait ElementKernel: Send + Sync + fmt::Debug {
    /// Stiffness (structural) or conductance (thermal) matrix.
    ///
    /// When `ctx.displacement` is set, nonlinear formulations evaluate the
    /// tangent stiffness at that state.
    fn stiffness(&self, ctx: &ElementContext) -> FeltResult<Mat>;

    /// Mass (structural) or heat capacity (thermal) matrix
    fn mass(&self, ctx: &ElementContext, mode: MassMode) -> FeltResult<Mat>;

    /// Equivalent nodal forces of the element's distributed loads
    fn equivalent_loads(&self, _ctx: &ElementContext) -> FeltResult<Option<FEVec>> {
        Ok(None)
    }

    /// Element stresses from the element's nodal values
    fn stresses(&self, ctx: &ElementContext, values: &[f64]) -> FeltResult<Vec<f64>>;
}

/// A registered element formulation
#[derive(Debug)]
pub struct Definition {
    /// Unique name
    pub name: String,
    /// Nodes per element
    pub num_nodes: usize,
    /// DOF signature of each node
    pub dofs: Vec<Dof>,
    pub domain: Domain,
    /// Whether distributed loads may be applied
    pub accepts_loads: bool,
    /// Whether the stiffness depends on the current displacement
    pub nonlinear: bool,
    pub kernel: Box<dyn ElementKernel>,
}

impl Definition {
    /// Create a definition
    pub fn new(
        name: &str,
        num_nodes: usize,
        dofs: &[Dof],
        domain: Domain,
        kernel: Box<dyn ElementKernel>,
    ) -> Self {
        Self {
            name: name.to_string(),
            num_nodes,
            dofs: dofs.to_vec(),
            domain,
            accepts_loads: false,
            nonlinear: false,
            kernel,
        }
    }

    /// Allow distributed loads on elements of this definition
    pub fn with_loads(mut self) -> Self {
        self.accepts_loads = true;
        self
    }

    /// Mark the formulation as geometrically nonlinear
    pub fn with_nonlinear(mut self) -> Self {
        self.nonlinear = true;
        self
    }
}

/// Name-keyed catalog of element definitions
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: BTreeMap<String, Arc<Definition>>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in formulations
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for definition in [
            rod::definition(),
            truss::definition(),
            beam::definition(),
            htk::definition(),
        ] {
            // Built-in names are distinct
            let _ = registry.register(definition);
        }
        registry
    }

    /// Install a definition. Fails if the name is already taken.
    pub fn register(&mut self, definition: Definition) -> FeltResult<Arc<Definition>> {
        if self.definitions.contains_key(&definition.name) {
            return Err(FeltError::DuplicateDefinition(definition.name));
        }
        let definition = Arc::new(definition);
        self.definitions
            .insert(definition.name.clone(), Arc::clone(&definition));
        Ok(definition)
    }

    /// Remove and return a definition. Fails if no definition has that name.
    pub fn unregister(&mut self, name: &str) -> FeltResult<Arc<Definition>> {
        self.definitions
            .remove(name)
            .ok_or_else(|| FeltError::DefinitionNotFound(name.to_string()))
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Definition>> {
        self.definitions.get(name).cloned()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
