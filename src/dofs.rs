//! Degrees of freedom, active-DOF enumeration and bandwidth renumbering
//!
//! Every node carries the same set of active DOFs (the union of the DOF
//! signatures of the element definitions in use). The global equation index
//! of a nodal DOF is `eq_position * num_dofs + position(dof)`, where
//! `eq_position` starts out as the node's input order and may be permuted by
//! [`renumber_nodes`]. [`restore_node_numbers`] undoes that permutation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definitions::Domain;
use crate::error::{FeltError, FeltResult};
use crate::math::{bandwidth, inverse_permutation, reverse_cuthill_mckee, SparseMatrixBuilder};
use crate::model::Problem;

/// A nodal degree of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dof {
    Tx,
    Ty,
    Tz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    /// All DOFs in canonical order
    pub const ALL: [Dof; 6] = [Dof::Tx, Dof::Ty, Dof::Tz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Index in `[Tx, Ty, Tz, Rx, Ry, Rz]`
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in tables
    pub fn label(self) -> &'static str {
        match self {
            Dof::Tx => "Tx",
            Dof::Ty => "Ty",
            Dof::Tz => "Tz",
            Dof::Rx => "Rx",
            Dof::Ry => "Ry",
            Dof::Rz => "Rz",
        }
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The DOFs active in a problem and their per-node positions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DofMap {
    active: Vec<Dof>,
    position: [Option<usize>; 6],
}

impl DofMap {
    /// Build a map from a set of DOFs, kept in canonical order
    pub fn new(dofs: &[Dof]) -> Self {
        let mut active: Vec<Dof> = dofs.to_vec();
        active.sort();
        active.dedup();

        let mut position = [None; 6];
        for (i, dof) in active.iter().enumerate() {
            position[dof.index()] = Some(i);
        }
        Self { active, position }
    }

    /// Active DOFs per node
    pub fn num_dofs(&self) -> usize {
        self.active.len()
    }

    /// Active DOFs in canonical order
    pub fn active(&self) -> &[Dof] {
        &self.active
    }

    /// Position of a DOF within a node's block of equations
    pub fn position(&self, dof: Dof) -> Option<usize> {
        self.position[dof.index()]
    }

    pub fn is_active(&self, dof: Dof) -> bool {
        self.position(dof).is_some()
    }

    /// Global equation index of `dof` at a node with equation position `eq_position`
    pub fn global_index(&self, eq_position: usize, dof: Dof) -> Option<usize> {
        self.position(dof)
            .map(|pos| eq_position * self.active.len() + pos)
    }
}

/// Determine the active DOFs and assign every node its equation position.
///
/// Returns the total number of global equations. A problem without nodes,
/// elements or active DOFs has nothing to solve.
pub fn find_active_dofs(problem: &mut Problem) -> FeltResult<usize> {
    if problem.nodes.is_empty() || problem.elements.is_empty() {
        return Err(FeltError::NothingToDo);
    }

    let dofs: Vec<Dof> = if problem.analysis.mode.domain() == Domain::Thermal {
        vec![Dof::Tx]
    } else {
        problem
            .elements
            .iter()
            .flat_map(|element| element.definition.dofs.iter().copied())
            .collect()
    };

    let map = DofMap::new(&dofs);
    if map.num_dofs() == 0 {
        return Err(FeltError::NothingToDo);
    }

    for (id, node) in problem.nodes.iter_mut().enumerate() {
        node.eq_position = id;
    }

    let equations = problem.nodes.len() * map.num_dofs();
    log::debug!(
        "active DOFs: {:?} ({} equations)",
        map.active(),
        equations
    );
    problem.dof_map = map;
    Ok(equations)
}

/// Snapshot of a node renumbering: renumbered index to original node number.
///
/// Produced by [`renumber_nodes`] and consumed by [`restore_node_numbers`].
#[derive(Debug)]
pub struct Renumbering {
    old_numbers: Vec<u32>,
    permuted: bool,
}

impl Renumbering {
    /// The renumbering that leaves every node in input order
    pub fn identity(problem: &Problem) -> Self {
        Self {
            old_numbers: problem.nodes.iter().map(|node| node.number).collect(),
            permuted: false,
        }
    }

    /// Whether any node moved
    pub fn is_permuted(&self) -> bool {
        self.permuted
    }
}

/// Reorder node equation positions with reverse Cuthill-McKee.
///
/// The new order is applied only if it reduces the node bandwidth of the
/// element-node adjacency graph; otherwise the identity renumbering is
/// returned.
pub fn renumber_nodes(problem: &mut Problem) -> Renumbering {
    let n = problem.nodes.len();
    let mut adjacency = SparseMatrixBuilder::new(n);
    for id in 0..n {
        adjacency.add(id, id, 1.0);
    }
    for element in &problem.elements {
        for &a in &element.nodes {
            for &b in &element.nodes {
                if a != b {
                    adjacency.add(a, b, 1.0);
                }
            }
        }
    }
    let csr = adjacency.to_csr();

    let current: Vec<usize> = problem.nodes.iter().map(|node| node.eq_position).collect();
    let perm = reverse_cuthill_mckee(&csr);
    let position = inverse_permutation(&perm);

    let before = bandwidth(&csr, &current);
    let after = bandwidth(&csr, &position);
    if after >= before {
        log::debug!("renumbering skipped (bandwidth {} not reduced)", before);
        return Renumbering::identity(problem);
    }

    log::info!("renumbered nodes: bandwidth {} -> {}", before, after);
    for (id, node) in problem.nodes.iter_mut().enumerate() {
        node.eq_position = position[id];
    }

    let old_numbers = perm.iter().map(|&id| problem.nodes[id].number).collect();
    Renumbering {
        old_numbers,
        permuted: true,
    }
}

/// Return every node to its input equation position
pub fn restore_node_numbers(problem: &mut Problem, renumbering: Renumbering) {
    if !renumbering.is_permuted() {
        return;
    }
    for (index, number) in renumbering.old_numbers.into_iter().enumerate() {
        if let Some(id) = problem.node_id(number) {
            debug_assert_eq!(problem.nodes[id].eq_position, index);
            problem.nodes[id].eq_position = id;
        }
    }
}
