//! JSON model files
//!
//! A model file is a JSON object with a title, the analysis parameters, the
//! named templates (materials, constraints, forces, loads), the mesh (nodes
//! and elements) and optional load cases. Templates are referenced by name
//! and nodes and elements by number:
//!
//! ```json
//! {
//!   "title": "bar",
//!   "analysis": { "mode": "static" },
//!   "materials": [{ "name": "steel", "e": 200e9, "a": 0.01 }],
//!   "constraints": [{ "name": "fixed", "restrain": ["tx"] }],
//!   "forces": [{ "name": "P", "values": { "tx": 1000.0 } }],
//!   "nodes": [
//!     { "number": 1, "x": 0.0, "constraint": "fixed" },
//!     { "number": 2, "x": 1.0, "force": "P" }
//!   ],
//!   "elements": [{ "number": 1, "type": "rod", "nodes": [1, 2], "material": "steel" }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisParameters;
use crate::dofs::Dof;
use crate::elements::{Constraint, Material};
use crate::error::FeltResult;
use crate::loads::{DistributedLoad, Force, Forcing};
use crate::model::Problem;

/// Per-DOF values; DOFs left out are zero (or absent)
pub type DofValues<T = f64> = BTreeMap<Dof, T>;

// ========================
// File Data Structures
// ========================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelData {
    pub title: String,
    pub analysis: AnalysisParameters,
    pub materials: Vec<Material>,
    pub constraints: Vec<ConstraintData>,
    pub forces: Vec<ForceData>,
    pub loads: Vec<DistributedLoad>,
    pub nodes: Vec<NodeData>,
    pub elements: Vec<ElementData>,
    pub load_cases: Vec<LoadCaseData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintData {
    pub name: String,
    /// Restrained DOFs
    pub restrain: Vec<Dof>,
    /// Prescribed values; a DOF listed here is restrained as well
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub boundary: DofValues,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub initial_displacement: DofValues,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub initial_velocity: DofValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceData {
    pub name: String,
    /// Constant values or time histories
    pub values: DofValues<Forcing>,
    /// Input power spectra
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub spectra: DofValues<Forcing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub number: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementData {
    pub number: u32,
    /// Definition name
    #[serde(rename = "type")]
    pub definition: String,
    pub nodes: Vec<u32>,
    pub material: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loads: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeForceData {
    pub node: u32,
    pub force: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementLoadData {
    pub element: u32,
    pub load: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCaseData {
    pub name: String,
    #[serde(default)]
    pub forces: Vec<NodeForceData>,
    #[serde(default)]
    pub loads: Vec<ElementLoadData>,
}

// ========================
// Conversion
// ========================

impl From<ConstraintData> for Constraint {
    fn from(data: ConstraintData) -> Self {
        let mut constraint = Constraint::free(&data.name);
        for dof in data.restrain {
            constraint = constraint.with_restraint(dof);
        }
        for (dof, value) in data.boundary {
            constraint = constraint.with_boundary(dof, value);
        }
        for (dof, value) in data.initial_displacement {
            constraint = constraint.with_initial_displacement(dof, value);
        }
        for (dof, value) in data.initial_velocity {
            constraint = constraint.with_initial_velocity(dof, value);
        }
        constraint
    }
}

impl From<&Constraint> for ConstraintData {
    fn from(constraint: &Constraint) -> Self {
        let nonzero = |values: &[f64; 6], only_restrained: bool| -> DofValues {
            Dof::ALL
                .into_iter()
                .filter(|&dof| !only_restrained || constraint.is_restrained(dof))
                .filter(|&dof| values[dof.index()] != 0.0)
                .map(|dof| (dof, values[dof.index()]))
                .collect()
        };
        Self {
            name: constraint.name.clone(),
            restrain: Dof::ALL
                .into_iter()
                .filter(|&dof| constraint.is_restrained(dof))
                .collect(),
            boundary: nonzero(&constraint.boundary, true),
            initial_displacement: nonzero(&constraint.initial_displacement, false),
            initial_velocity: nonzero(&constraint.initial_velocity, false),
        }
    }
}

impl From<ForceData> for Force {
    fn from(data: ForceData) -> Self {
        let mut force = Force::new(&data.name);
        for (dof, forcing) in data.values {
            force.components[dof.index()] = Some(forcing);
        }
        for (dof, spectrum) in data.spectra {
            force = force.with_spectrum(dof, spectrum);
        }
        force
    }
}

impl From<&Force> for ForceData {
    fn from(force: &Force) -> Self {
        let present = |terms: &[Option<Forcing>; 6]| -> DofValues<Forcing> {
            Dof::ALL
                .into_iter()
                .filter_map(|dof| terms[dof.index()].clone().map(|forcing| (dof, forcing)))
                .collect()
        };
        Self {
            name: force.name.clone(),
            values: present(&force.components),
            spectra: present(&force.spectra),
        }
    }
}

impl ModelData {
    /// Build a problem, resolving every name and number reference
    pub fn into_problem(self) -> FeltResult<Problem> {
        let mut problem = Problem::new(&self.title);
        problem.analysis = self.analysis;

        for material in self.materials {
            problem.add_material(material)?;
        }
        for constraint in self.constraints {
            problem.add_constraint(constraint.into())?;
        }
        for force in self.forces {
            problem.add_force(force.into())?;
        }
        for load in self.loads {
            problem.add_load(load)?;
        }

        for node in &self.nodes {
            problem.add_node(node.number, node.x, node.y, node.z)?;
            if let Some(constraint) = &node.constraint {
                problem.constrain_node(node.number, constraint)?;
            }
            if let Some(force) = &node.force {
                problem.apply_force(node.number, force)?;
            }
        }

        for element in &self.elements {
            problem.add_element(
                element.number,
                &element.definition,
                &element.nodes,
                &element.material,
            )?;
            for load in &element.loads {
                problem.add_element_load(element.number, load)?;
            }
        }

        for case in &self.load_cases {
            let forces: Vec<(u32, &str)> = case
                .forces
                .iter()
                .map(|f| (f.node, f.force.as_str()))
                .collect();
            let loads: Vec<(u32, &str)> = case
                .loads
                .iter()
                .map(|l| (l.element, l.load.as_str()))
                .collect();
            problem.add_load_case(&case.name, &forces, &loads)?;
        }

        log::info!(
            "loaded '{}': {} nodes, {} elements",
            problem.title,
            problem.nodes.len(),
            problem.elements.len()
        );
        Ok(problem)
    }

    /// Describe a problem in file form
    pub fn from_problem(problem: &Problem) -> Self {
        let number = |id: usize| problem.nodes[id].number;
        Self {
            title: problem.title.clone(),
            analysis: problem.analysis.clone(),
            materials: problem.materials.values().map(|m| (**m).clone()).collect(),
            constraints: problem.constraints.values().map(|c| c.as_ref().into()).collect(),
            forces: problem.forces.values().map(|f| f.as_ref().into()).collect(),
            loads: problem.loads.values().map(|l| (**l).clone()).collect(),
            nodes: problem
                .nodes
                .iter()
                .map(|node| NodeData {
                    number: node.number,
                    x: node.x,
                    y: node.y,
                    z: node.z,
                    constraint: node.constraint.as_ref().map(|c| c.name.clone()),
                    force: node.force.as_ref().map(|f| f.name.clone()),
                })
                .collect(),
            elements: problem
                .elements
                .iter()
                .map(|element| ElementData {
                    number: element.number,
                    definition: element.definition.name.clone(),
                    nodes: element.nodes.iter().map(|&id| number(id)).collect(),
                    material: element.material.name.clone(),
                    loads: element.loads.iter().map(|l| l.name.clone()).collect(),
                })
                .collect(),
            load_cases: problem
                .load_cases
                .iter()
                .map(|case| LoadCaseData {
                    name: case.name.clone(),
                    forces: case
                        .forces
                        .iter()
                        .map(|(id, force)| NodeForceData {
                            node: number(*id),
                            force: force.name.clone(),
                        })
                        .collect(),
                    loads: case
                        .loads
                        .iter()
                        .map(|(id, load)| ElementLoadData {
                            element: problem.elements[*id].number,
                            load: load.name.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Parse a model from JSON text
pub fn parse_model(text: &str) -> FeltResult<Problem> {
    let data: ModelData = serde_json::from_str(text)?;
    data.into_problem()
}

/// Read a model from any reader
pub fn load_model_reader<R: Read>(reader: R) -> FeltResult<Problem> {
    let data: ModelData = serde_json::from_reader(reader)?;
    data.into_problem()
}

/// Read a model file
pub fn load_model(path: &Path) -> FeltResult<Problem> {
    log::debug!("reading model {}", path.display());
    load_model_reader(BufReader::new(File::open(path)?))
}

/// Write a problem back out as JSON
pub fn write_model<W: Write>(problem: &Problem, writer: W) -> FeltResult<()> {
    serde_json::to_writer_pretty(writer, &ModelData::from_problem(problem))?;
    Ok(())
}
