//! Result artifacts handed to output sinks
//!
//! Every artifact is keyed by node and element numbers, never by equation
//! positions, so results read the same whether or not nodes were renumbered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dofs::Dof;
use crate::math::{Mat, Vec as FEVec};
use crate::model::Problem;

/// A nodal DOF identified by node number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DofKey {
    pub node: u32,
    pub dof: Dof,
}

impl DofKey {
    pub fn new(node: u32, dof: Dof) -> Self {
        Self { node, dof }
    }

    /// Global equation index in the problem's current numbering
    pub fn global_index(&self, problem: &Problem) -> Option<usize> {
        crate::assembly::global_index(problem, self.node, self.dof)
    }

    /// Keys for every (node, dof) pair, nodes outermost
    pub fn grid(nodes: &[u32], dofs: &[Dof]) -> Vec<DofKey> {
        nodes
            .iter()
            .flat_map(|&node| dofs.iter().map(move |&dof| DofKey::new(node, dof)))
            .collect()
    }

    /// Keys for every active DOF of every node, in input order
    pub fn all(problem: &Problem) -> Vec<DofKey> {
        let numbers: Vec<u32> = problem.nodes.iter().map(|node| node.number).collect();
        Self::grid(&numbers, problem.dof_map().active())
    }
}

impl fmt::Display for DofKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.dof, self.node)
    }
}

/// Pick the entries of a global vector for a list of keys
pub fn extract(problem: &Problem, keys: &[DofKey], d: &FEVec) -> Vec<f64> {
    keys.iter()
        .map(|key| key.global_index(problem).map_or(0.0, |i| d[i]))
        .collect()
}

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Node number
    pub node: u32,
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction
    pub dz: f64,
    /// Rotation about X axis
    pub rx: f64,
    /// Rotation about Y axis
    pub ry: f64,
    /// Rotation about Z axis
    pub rz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(node: u32, arr: [f64; 6]) -> Self {
        Self {
            node,
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    /// Value of one DOF
    pub fn get(&self, dof: Dof) -> f64 {
        match dof {
            Dof::Tx => self.dx,
            Dof::Ty => self.dy,
            Dof::Tz => self.dz,
            Dof::Rx => self.rx,
            Dof::Ry => self.ry,
            Dof::Rz => self.rz,
        }
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }
}

/// Reaction at a restrained DOF
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Reaction {
    pub node: u32,
    pub dof: Dof,
    pub force: f64,
}

/// Stresses of one element; the meaning of the values depends on its definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementStress {
    pub element: u32,
    pub definition: String,
    pub values: Vec<f64>,
}

/// Summary of a static solution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Maximum translation magnitude
    pub max_displacement: f64,
    /// Node with maximum displacement
    pub max_disp_node: u32,
    /// Largest reaction magnitude
    pub max_reaction: f64,
    /// Node carrying the largest reaction
    pub max_reaction_node: u32,
    pub num_nodes: usize,
    pub num_elements: usize,
    /// Total equations
    pub total_dofs: usize,
    /// Unconstrained equations
    pub free_dofs: usize,
}

/// Displacements, reactions and element stresses of a static solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticResults {
    pub displacements: Vec<NodeDisplacement>,
    pub reactions: Vec<Reaction>,
    pub stresses: Vec<ElementStress>,
    pub summary: AnalysisSummary,
}

impl StaticResults {
    /// Displacement of the node with a given number
    pub fn displacement(&self, node: u32) -> Option<&NodeDisplacement> {
        self.displacements.iter().find(|d| d.node == node)
    }

    /// Sum of reactions in one DOF
    pub fn total_reaction(&self, dof: Dof) -> f64 {
        self.reactions
            .iter()
            .filter(|r| r.dof == dof)
            .map(|r| r.force)
            .sum()
    }
}

/// Nodal temperature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeTemperature {
    pub node: u32,
    pub temperature: f64,
}

/// Temperatures and heat fluxes of a steady-state thermal solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureResults {
    pub temperatures: Vec<NodeTemperature>,
    pub fluxes: Vec<ElementStress>,
}

impl TemperatureResults {
    pub fn temperature(&self, node: u32) -> Option<f64> {
        self.temperatures
            .iter()
            .find(|t| t.node == node)
            .map(|t| t.temperature)
    }
}

/// A table of nodal values: one row per load case, load step, time step or
/// frequency, one column per requested (node, dof)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    pub title: String,
    /// Heading of the row label column ("time", "case", "force", ...)
    pub row_label: String,
    /// Row labels
    pub rows: Vec<String>,
    /// Numeric abscissa of each row, used for plotting
    pub abscissa: Vec<f64>,
    pub columns: Vec<DofKey>,
    /// `rows.len()` x `columns.len()`
    pub values: Mat,
}

impl ResultTable {
    /// Create an empty table with the given columns
    pub fn new(title: &str, row_label: &str, columns: Vec<DofKey>) -> Self {
        let width = columns.len();
        Self {
            title: title.to_string(),
            row_label: row_label.to_string(),
            rows: Vec::new(),
            abscissa: Vec::new(),
            columns,
            values: Mat::zeros(0, width),
        }
    }

    /// Append one row
    pub fn push_row(&mut self, label: String, abscissa: f64, values: &[f64]) {
        let row = self.rows.len();
        let width = self.columns.len();
        let table = std::mem::replace(&mut self.values, Mat::zeros(0, 0));
        self.values = table.insert_row(row, 0.0);
        for (j, value) in values.iter().take(width).enumerate() {
            self.values[(row, j)] = *value;
        }
        self.rows.push(label);
        self.abscissa.push(abscissa);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// One column of values
    pub fn column(&self, key: DofKey) -> Option<Vec<f64>> {
        let j = self.columns.iter().position(|&c| c == key)?;
        Some(self.values.column(j).iter().copied().collect())
    }
}

/// Eigenvalues and mode shapes of a modal analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EigenResults {
    /// Eigenvalues (squared circular frequencies), ascending
    pub eigenvalues: Vec<f64>,
    /// Mode shape rows
    pub dofs: Vec<DofKey>,
    /// `dofs.len()` x number of modes, each column normalized by its first
    /// significant entry
    pub modes: Mat,
}

impl EigenResults {
    /// Natural frequencies in Hz
    pub fn frequencies(&self) -> Vec<f64> {
        self.eigenvalues
            .iter()
            .map(|&lambda| lambda.max(0.0).sqrt() / (2.0 * std::f64::consts::PI))
            .collect()
    }
}

/// Mass, damping and stiffness projected onto the mode shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalMatrices {
    pub mass: Mat,
    pub damping: Mat,
    pub stiffness: Mat,
    /// Whether the modes were scaled to unit modal mass
    pub orthonormal: bool,
}

/// Magnitudes of the transfer functions from each forced DOF to each output DOF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFunctions {
    /// Circular frequencies
    pub frequencies: Vec<f64>,
    pub inputs: Vec<DofKey>,
    pub outputs: Vec<DofKey>,
    /// One matrix per input: `frequencies.len()` x `outputs.len()`
    pub values: Vec<Mat>,
}

impl TransferFunctions {
    /// Whether no DOF is forced
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Transfer function of one input as a result table
    pub fn table(&self, input: usize) -> ResultTable {
        let mut table = ResultTable::new(
            &format!("transfer functions for input {}", self.inputs[input]),
            "frequency",
            self.outputs.clone(),
        );
        let matrix = &self.values[input];
        for (row, &omega) in self.frequencies.iter().enumerate() {
            let values: Vec<f64> = matrix.row(row).iter().copied().collect();
            table.push_row(format!("{:.4}", omega), omega, &values);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dof_key_grid_and_display() {
        let keys = DofKey::grid(&[3, 7], &[Dof::Tx, Dof::Rz]);
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[1], DofKey::new(3, Dof::Rz));
        assert_eq!(keys[2].to_string(), "Tx(7)");
    }

    #[test]
    fn test_result_table_rows() {
        let mut table = ResultTable::new("t", "time", DofKey::grid(&[1], &[Dof::Tx, Dof::Ty]));
        table.push_row("0".into(), 0.0, &[1.0, 2.0]);
        table.push_row("1".into(), 1.0, &[3.0, 4.0]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.values.shape(), (2, 2));
        assert_eq!(table.column(DofKey::new(1, Dof::Ty)), Some(vec![2.0, 4.0]));
        assert!(table.column(DofKey::new(2, Dof::Tx)).is_none());
    }

    #[test]
    fn test_frequencies_from_eigenvalues() {
        let eigen = EigenResults {
            eigenvalues: vec![4.0 * std::f64::consts::PI.powi(2)],
            dofs: Vec::new(),
            modes: Mat::zeros(0, 1),
        };
        assert!((eigen.frequencies()[0] - 1.0).abs() < 1e-12);
    }
}
