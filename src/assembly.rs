//! Global assembly, constrained-DOF condensation and element post-processing
//!
//! Element matrices come from each definition's kernel and are scattered into
//! the global system through the problem's [`DofMap`](crate::dofs::DofMap).
//! Kernel failures are logged and counted rather than returned, so a single
//! pass reports every bad element before the run is aborted.

use std::sync::Arc;

use crate::analysis::MassMode;
use crate::definitions::ElementContext;
use crate::dofs::Dof;
use crate::elements::Element;
use crate::loads::{DistributedLoad, LoadCase};
use crate::math::{Mat, SparseMatrixBuilder, Vec as FEVec};
use crate::model::Problem;

/// Global stiffness, mass and damping matrices
#[derive(Debug, Clone)]
pub struct DynamicMatrices {
    pub k: Mat,
    pub m: Mat,
    pub c: Mat,
}

/// Global equation indices of an element's DOFs (element DOF order)
pub fn element_dofs(problem: &Problem, element: &Element) -> Vec<Option<usize>> {
    let map = problem.dof_map();
    element
        .nodes
        .iter()
        .flat_map(|&id| {
            let eq_position = problem.nodes[id].eq_position;
            element
                .definition
                .dofs
                .iter()
                .map(move |&dof| map.global_index(eq_position, dof))
        })
        .collect()
}

fn context<'a>(
    problem: &Problem,
    element: &'a Element,
    loads: &'a [Arc<DistributedLoad>],
    displacement: Option<&'a [f64]>,
) -> ElementContext<'a> {
    ElementContext {
        number: element.number,
        coords: element.nodes.iter().map(|&id| problem.nodes[id].coords()).collect(),
        material: &element.material,
        loads,
        displacement,
    }
}

fn scatter(builder: &mut SparseMatrixBuilder, dofs: &[Option<usize>], matrix: &Mat) {
    for (i, di) in dofs.iter().enumerate() {
        let Some(di) = *di else { continue };
        for (j, dj) in dofs.iter().enumerate() {
            if let Some(dj) = *dj {
                builder.add(di, dj, matrix[(i, j)]);
            }
        }
    }
}

fn gather(dofs: &[Option<usize>], d: &FEVec) -> Vec<f64> {
    dofs.iter().map(|dof| dof.map_or(0.0, |i| d[i])).collect()
}

fn report(element: &Element, error: &crate::error::FeltError) {
    log::error!("{} element {}: {}", element.definition.name, element.number, error);
}

/// Assemble the global stiffness matrix, returning it with the number of
/// elements that failed.
pub fn assemble_stiffness(problem: &Problem) -> (Mat, usize) {
    assemble_tangent(problem, None)
}

/// Assemble the tangent stiffness at global displacement `d`.
///
/// Elements of nonlinear definitions are evaluated on the deformed geometry.
pub fn assemble_nonlinear_stiffness(problem: &Problem, d: &FEVec) -> (Mat, usize) {
    assemble_tangent(problem, Some(d))
}

fn assemble_tangent(problem: &Problem, d: Option<&FEVec>) -> (Mat, usize) {
    let n = problem.num_equations();
    let mut builder = SparseMatrixBuilder::new(n);
    let mut errors = 0;

    for element in &problem.elements {
        let dofs = element_dofs(problem, element);
        let local = match d {
            Some(d) if element.definition.nonlinear => Some(gather(&dofs, d)),
            _ => None,
        };
        let ctx = context(problem, element, &element.loads, local.as_deref());
        match element.definition.kernel.stiffness(&ctx) {
            Ok(k) => scatter(&mut builder, &dofs, &k),
            Err(e) => {
                report(element, &e);
                errors += 1;
            }
        }
    }

    (builder.to_dense(), errors)
}

/// Assemble stiffness, mass and Rayleigh damping (`C = rk K + rm M` per
/// element material).
pub fn assemble_dynamic(problem: &Problem, mode: MassMode) -> (DynamicMatrices, usize) {
    let n = problem.num_equations();
    let mut k_builder = SparseMatrixBuilder::new(n);
    let mut m_builder = SparseMatrixBuilder::new(n);
    let mut c_builder = SparseMatrixBuilder::new(n);
    let mut errors = 0;

    for element in &problem.elements {
        let dofs = element_dofs(problem, element);
        let ctx = context(problem, element, &element.loads, None);
        let kernel = &element.definition.kernel;

        let matrices = kernel
            .stiffness(&ctx)
            .and_then(|k| kernel.mass(&ctx, mode).map(|m| (k, m)));
        match matrices {
            Ok((k, m)) => {
                if element.material.is_damped() {
                    let c = &k * element.material.rk + &m * element.material.rm;
                    scatter(&mut c_builder, &dofs, &c);
                }
                scatter(&mut k_builder, &dofs, &k);
                scatter(&mut m_builder, &dofs, &m);
            }
            Err(e) => {
                report(element, &e);
                errors += 1;
            }
        }
    }

    let matrices = DynamicMatrices {
        k: k_builder.to_dense(),
        m: m_builder.to_dense(),
        c: c_builder.to_dense(),
    };
    (matrices, errors)
}

/// Nodal forces evaluated at time `t`
pub fn nodal_forces(problem: &Problem, t: f64) -> FEVec {
    let map = problem.dof_map();
    let mut f = FEVec::zeros(problem.num_equations());
    for node in &problem.nodes {
        let Some(force) = &node.force else { continue };
        for &dof in map.active() {
            if let Some(i) = map.global_index(node.eq_position, dof) {
                f[i] += force.magnitude(dof, t);
            }
        }
    }
    f
}

fn add_element_loads(
    problem: &Problem,
    f: &mut FEVec,
    loads_of: impl Fn(usize, &Element) -> Vec<Arc<DistributedLoad>>,
) -> usize {
    let mut errors = 0;
    for (id, element) in problem.elements.iter().enumerate() {
        let loads = loads_of(id, element);
        if loads.is_empty() {
            continue;
        }
        let ctx = context(problem, element, &loads, None);
        match element.definition.kernel.equivalent_loads(&ctx) {
            Ok(Some(equivalent)) => {
                for (value, dof) in equivalent.iter().zip(element_dofs(problem, element)) {
                    if let Some(i) = dof {
                        f[i] += value;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                report(element, &e);
                errors += 1;
            }
        }
    }
    errors
}

/// Static load vector: nodal forces at `t = 0` plus the equivalent nodal
/// forces of every element's distributed loads.
pub fn static_force_vector(problem: &Problem) -> (FEVec, usize) {
    let mut f = nodal_forces(problem, 0.0);
    let errors = add_element_loads(problem, &mut f, |_, element| element.loads.clone());
    (f, errors)
}

/// Load vector of one load case; the problem's own forces and loads are ignored
pub fn case_force_vector(problem: &Problem, case: &LoadCase) -> (FEVec, usize) {
    let map = problem.dof_map();
    let mut f = FEVec::zeros(problem.num_equations());
    for (id, force) in &case.forces {
        let eq_position = problem.nodes[*id].eq_position;
        for &dof in map.active() {
            if let Some(i) = map.global_index(eq_position, dof) {
                f[i] += force.magnitude(dof, 0.0);
            }
        }
    }
    let errors = add_element_loads(problem, &mut f, |id, _| case.element_loads(id));
    (f, errors)
}

/// Global equation index of `dof` at node `number`
pub fn global_index(problem: &Problem, number: u32, dof: Dof) -> Option<usize> {
    let id = problem.node_id(number)?;
    problem
        .dof_map()
        .global_index(problem.nodes[id].eq_position, dof)
}

/// Initial displacement and velocity vectors from node constraints
pub fn initial_conditions(problem: &Problem) -> (FEVec, FEVec) {
    let map = problem.dof_map();
    let n = problem.num_equations();
    let mut d0 = FEVec::zeros(n);
    let mut v0 = FEVec::zeros(n);
    for node in &problem.nodes {
        let Some(constraint) = &node.constraint else { continue };
        for &dof in map.active() {
            if let Some(i) = map.global_index(node.eq_position, dof) {
                d0[i] = constraint.initial_displacement[dof.index()];
                v0[i] = constraint.initial_velocity[dof.index()];
            }
        }
    }
    (d0, v0)
}

/// Partition of the global equations into free and constrained DOFs
#[derive(Debug, Clone)]
pub struct Condensation {
    size: usize,
    free: Vec<usize>,
    fixed: Vec<usize>,
    /// Free-system index of each global equation
    lookup: Vec<Option<usize>>,
    /// Prescribed boundary values (zero at free equations)
    prescribed: FEVec,
}

impl Condensation {
    /// Partition the problem's equations using the node constraints
    pub fn new(problem: &Problem) -> Self {
        let map = problem.dof_map();
        let size = problem.num_equations();
        let mut restrained = vec![false; size];
        let mut prescribed = FEVec::zeros(size);

        for node in &problem.nodes {
            let Some(constraint) = &node.constraint else { continue };
            for &dof in map.active() {
                if !constraint.is_restrained(dof) {
                    continue;
                }
                if let Some(i) = map.global_index(node.eq_position, dof) {
                    restrained[i] = true;
                    prescribed[i] = constraint.boundary_value(dof);
                }
            }
        }

        let mut free = Vec::new();
        let mut fixed = Vec::new();
        let mut lookup = vec![None; size];
        for (i, &is_fixed) in restrained.iter().enumerate() {
            if is_fixed {
                fixed.push(i);
            } else {
                lookup[i] = Some(free.len());
                free.push(i);
            }
        }

        log::debug!("condensation: {} free, {} constrained", free.len(), fixed.len());
        Self {
            size,
            free,
            fixed,
            lookup,
            prescribed,
        }
    }

    /// Number of unconstrained equations
    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Global equation count
    pub fn size(&self) -> usize {
        self.size
    }

    /// Constrained global equations
    pub fn fixed(&self) -> &[usize] {
        &self.fixed
    }

    /// Position of a global equation in the condensed system
    pub fn free_index(&self, global: usize) -> Option<usize> {
        self.lookup.get(global).copied().flatten()
    }

    /// Whether any boundary value is nonzero
    pub fn has_prescribed(&self) -> bool {
        self.fixed.iter().any(|&i| self.prescribed[i] != 0.0)
    }

    /// Remove constrained rows and columns
    pub fn condense_matrix(&self, a: &Mat) -> Mat {
        a.select_rows(&self.free).select_columns(&self.free)
    }

    /// Remove constrained entries
    pub fn condense_vector(&self, v: &FEVec) -> FEVec {
        FEVec::from_iterator(self.free.len(), self.free.iter().map(|&i| v[i]))
    }

    /// Condense `K d = F`, moving prescribed boundary values to the right-hand side
    pub fn condense_system(&self, k: &Mat, f: &FEVec) -> (Mat, FEVec) {
        (self.condense_matrix(k), self.condense_rhs(k, f))
    }

    /// Condensed right-hand side `F_f - K_fp d_p`
    pub fn condense_rhs(&self, k: &Mat, f: &FEVec) -> FEVec {
        let mut rhs = self.condense_vector(f);
        if self.has_prescribed() {
            for (row, &i) in self.free.iter().enumerate() {
                let coupling: f64 = self.fixed.iter().map(|&j| k[(i, j)] * self.prescribed[j]).sum();
                rhs[row] -= coupling;
            }
        }
        rhs
    }

    /// Full-length vector from a condensed solution, with boundary values filled in
    pub fn expand(&self, reduced: &FEVec) -> FEVec {
        let mut full = self.prescribed.clone();
        for (row, &i) in self.free.iter().enumerate() {
            full[i] = reduced[row];
        }
        full
    }

    /// Full-height matrix from condensed columns, zero at constrained rows
    pub fn expand_modes(&self, reduced: &Mat) -> Mat {
        let mut full = Mat::zeros(self.size, reduced.ncols());
        for (row, &i) in self.free.iter().enumerate() {
            full.row_mut(i).copy_from(&reduced.row(row));
        }
        full
    }
}

/// Copy a global solution into the nodes' solved values
pub fn store_nodal_values(problem: &mut Problem, d: &FEVec) {
    let map = problem.dof_map().clone();
    for node in &mut problem.nodes {
        node.values = [0.0; 6];
        for &dof in map.active() {
            if let Some(i) = map.global_index(node.eq_position, dof) {
                node.values[dof.index()] = d[i];
            }
        }
    }
}

/// Compute element stresses from the nodes' solved values.
///
/// Returns the number of elements that failed.
pub fn element_stresses(problem: &mut Problem) -> usize {
    let mut errors = 0;
    let mut results = Vec::with_capacity(problem.elements.len());

    for element in &problem.elements {
        let values: Vec<f64> = element
            .nodes
            .iter()
            .flat_map(|&id| {
                let node = &problem.nodes[id];
                element.definition.dofs.iter().map(move |dof| node.values[dof.index()])
            })
            .collect();
        let ctx = context(problem, element, &element.loads, None);
        match element.definition.kernel.stresses(&ctx, &values) {
            Ok(stresses) => results.push(stresses),
            Err(e) => {
                report(element, &e);
                errors += 1;
                results.push(Vec::new());
            }
        }
    }

    for (element, stresses) in problem.elements.iter_mut().zip(results) {
        element.stresses = stresses;
    }
    errors
}

/// Reactions `K d - F` at every constrained equation, as `(node index, dof, value)`
pub fn reactions(
    problem: &Problem,
    k: &Mat,
    f: &FEVec,
    d: &FEVec,
    condensation: &Condensation,
) -> Vec<(usize, Dof, f64)> {
    let residual = k * d - f;
    let map = problem.dof_map();
    let mut reactions = Vec::new();
    for (id, node) in problem.nodes.iter().enumerate() {
        for &dof in map.active() {
            let Some(i) = map.global_index(node.eq_position, dof) else { continue };
            if condensation.free_index(i).is_none() {
                reactions.push((id, dof, residual[i]));
            }
        }
    }
    reactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dofs::find_active_dofs;
    use crate::elements::{Constraint, Material};
    use crate::loads::{Force, LoadDirection};
    use approx::assert_relative_eq;

    fn two_rods() -> Problem {
        let mut problem = Problem::new("rods");
        problem
            .add_material(Material::elastic("steel", 100.0, 1.0, 1.0))
            .unwrap();
        problem.add_constraint(Constraint::fixed("fixed")).unwrap();
        problem
            .add_constraint(Constraint::free("moved").with_boundary(Dof::Tx, 0.5))
            .unwrap();
        for number in 1..=3 {
            problem.add_node(number, number as f64, 0.0, 0.0).unwrap();
        }
        problem.add_element(1, "rod", &[1, 2], "steel").unwrap();
        problem.add_element(2, "rod", &[2, 3], "steel").unwrap();
        problem.constrain_node(1, "fixed").unwrap();
        find_active_dofs(&mut problem).unwrap();
        problem
    }

    #[test]
    fn test_assemble_stiffness() {
        let problem = two_rods();
        let (k, errors) = assemble_stiffness(&problem);
        assert_eq!(errors, 0);
        assert_relative_eq!(k[(1, 1)], 200.0);
        assert_relative_eq!(k[(0, 1)], -100.0);
        assert_relative_eq!(k[(0, 2)], 0.0);
    }

    #[test]
    fn test_kernel_failures_are_counted() {
        let mut problem = two_rods();
        problem.add_material(Material::new("empty")).unwrap();
        problem.add_node(4, 4.0, 0.0, 0.0).unwrap();
        problem.add_element(3, "rod", &[3, 4], "empty").unwrap();
        find_active_dofs(&mut problem).unwrap();
        let (_, errors) = assemble_stiffness(&problem);
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_condensation_moves_boundary_values() {
        let mut problem = two_rods();
        problem.constrain_node(3, "moved").unwrap();
        let (k, _) = assemble_stiffness(&problem);
        let f = FEVec::zeros(3);

        let condensation = Condensation::new(&problem);
        assert_eq!(condensation.num_free(), 1);
        assert_eq!(condensation.fixed(), &[0, 2]);

        let (kc, fc) = condensation.condense_system(&k, &f);
        assert_eq!(kc.nrows(), 1);
        assert_relative_eq!(fc[0], 50.0);

        let d = condensation.expand(&FEVec::from_vec(vec![0.25]));
        assert_relative_eq!(d[2], 0.5);
        assert_relative_eq!(d[1], 0.25);
    }

    #[test]
    fn test_force_vectors() {
        let mut problem = two_rods();
        problem.add_force(Force::new("P").with_component(Dof::Tx, 10.0)).unwrap();
        problem.apply_force(3, "P").unwrap();
        problem
            .add_load(DistributedLoad::uniform("w", LoadDirection::Parallel, 2.0))
            .unwrap();
        problem.add_element_load(2, "w").unwrap();

        let (f, errors) = static_force_vector(&problem);
        assert_eq!(errors, 0);
        assert_relative_eq!(f[1], 1.0);
        assert_relative_eq!(f[2], 11.0);

        problem.add_load_case("only load", &[], &[(1, "w")]).unwrap();
        let (fc, _) = case_force_vector(&problem, &problem.load_cases[0]);
        assert_relative_eq!(fc[0], 1.0);
        assert_relative_eq!(fc[1], 1.0);
        assert_relative_eq!(fc[2], 0.0);
    }
}
