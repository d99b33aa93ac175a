//! Nonlinear static analysis by successive substitution
//!
//! The load is applied in `load_steps` equal increments. Within each
//! increment the stiffness is re-evaluated at the current displacement and
//! `K(d) d = F` is re-solved until the relative change of `d` drops below the
//! tolerance. Substitution and incremental analyses share this scheme.

use crate::analysis::AnalysisParameters;
use crate::assembly::{assemble_nonlinear_stiffness, Condensation};
use crate::error::{FeltError, FeltResult};
use crate::math::{solve_direct, Vec as FEVec};
use crate::model::Problem;

/// Iteration controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearControls {
    pub iterations: usize,
    pub tolerance: f64,
    pub load_steps: usize,
    pub relaxation: f64,
}

impl From<&AnalysisParameters> for NonlinearControls {
    fn from(params: &AnalysisParameters) -> Self {
        Self {
            iterations: params.iterations,
            tolerance: params.tolerance,
            load_steps: params.load_steps.max(1),
            relaxation: params.relaxation,
        }
    }
}

fn iterate(
    problem: &Problem,
    condensation: &Condensation,
    f: &FEVec,
    start: FEVec,
    controls: &NonlinearControls,
) -> FeltResult<FEVec> {
    let mut d = start;
    for iteration in 1..=controls.iterations {
        let (k, errors) = assemble_nonlinear_stiffness(problem, &d);
        if errors > 0 {
            log::error!("{} element errors during nonlinear iteration {}", errors, iteration);
            return Err(FeltError::Assembly(errors));
        }
        let (kc, fc) = condensation.condense_system(&k, f);
        let Some(solution) = solve_direct(&kc, &fc) else {
            log::error!("singular tangent stiffness at iteration {}", iteration);
            return Err(FeltError::SingularMatrix);
        };

        let current = condensation.condense_vector(&d);
        let change = (&solution - &current).norm();
        let scale = solution.norm().max(f64::MIN_POSITIVE);
        let updated = &current + (&solution - &current) * controls.relaxation;
        d = condensation.expand(&updated);

        log::debug!("iteration {}: relative change {:.3e}", iteration, change / scale);
        if change <= controls.tolerance * scale {
            return Ok(d);
        }
    }
    log::error!("no convergence after {} iterations", controls.iterations);
    Err(FeltError::ConvergenceFailed(controls.iterations))
}

fn solve_from(
    problem: &Problem,
    condensation: &Condensation,
    f: &FEVec,
    start: FEVec,
    controls: &NonlinearControls,
) -> FeltResult<FEVec> {
    let mut d = start;
    for step in 1..=controls.load_steps {
        let fraction = step as f64 / controls.load_steps as f64;
        d = iterate(problem, condensation, &(f * fraction), d, controls)?;
    }
    Ok(d)
}

/// Solve the nonlinear static problem under the global load `f`.
///
/// Returns the full-length displacement vector. A tangent stiffness that
/// cannot be factorized is [`FeltError::SingularMatrix`]; running out of
/// iterations is [`FeltError::ConvergenceFailed`].
pub fn static_nonlinear_displacements(
    problem: &Problem,
    condensation: &Condensation,
    f: &FEVec,
    controls: &NonlinearControls,
) -> FeltResult<FEVec> {
    let start = condensation.expand(&FEVec::zeros(condensation.num_free()));
    solve_from(problem, condensation, f, start, controls)
}

/// Solve the nonlinear problem for each value of the force at global equation
/// `input`, continuing from the previous solution.
pub fn solve_nonlinear_load_range(
    problem: &Problem,
    condensation: &Condensation,
    base: &FEVec,
    input: usize,
    values: &[f64],
    controls: &NonlinearControls,
) -> FeltResult<Vec<FEVec>> {
    let mut d = condensation.expand(&FEVec::zeros(condensation.num_free()));
    let mut solutions = Vec::with_capacity(values.len());
    for &value in values {
        let mut f = base.clone();
        f[input] = value;
        d = solve_from(problem, condensation, &f, d, controls)?;
        solutions.push(d.clone());
    }
    Ok(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dofs::{find_active_dofs, Dof};
    use crate::elements::{Constraint, Material};
    use approx::assert_relative_eq;

    /// Single truss bar along x, fixed at node 1, free to move along x at node 2
    fn bar() -> Problem {
        let mut problem = Problem::new("bar");
        problem
            .add_material(Material::elastic("steel", 1000.0, 1.0, 1.0))
            .unwrap();
        problem.add_constraint(Constraint::fixed("fixed")).unwrap();
        problem
            .add_constraint(Constraint::free("roller").with_restraint(Dof::Ty).with_restraint(Dof::Tz))
            .unwrap();
        problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
        problem.add_node(2, 10.0, 0.0, 0.0).unwrap();
        problem.add_element(1, "truss", &[1, 2], "steel").unwrap();
        problem.constrain_node(1, "fixed").unwrap();
        problem.constrain_node(2, "roller").unwrap();
        find_active_dofs(&mut problem).unwrap();
        problem
    }

    fn controls() -> NonlinearControls {
        NonlinearControls {
            iterations: 20,
            tolerance: 1e-10,
            load_steps: 2,
            relaxation: 1.0,
        }
    }

    #[test]
    fn test_axial_bar_matches_linear_solution() {
        let problem = bar();
        let condensation = Condensation::new(&problem);
        let mut f = FEVec::zeros(6);
        f[3] = 5.0;
        let d = static_nonlinear_displacements(&problem, &condensation, &f, &controls()).unwrap();
        assert_relative_eq!(d[3], 5.0 * 10.0 / 1000.0, max_relative = 1e-8);
    }

    #[test]
    fn test_load_range_rows() {
        let problem = bar();
        let condensation = Condensation::new(&problem);
        let base = FEVec::zeros(6);
        let rows = solve_nonlinear_load_range(
            &problem,
            &condensation,
            &base,
            3,
            &[0.0, 1.0, 2.0],
            &controls(),
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_relative_eq!(rows[2][3], 2.0 * rows[1][3], max_relative = 1e-8);
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let problem = bar();
        let condensation = Condensation::new(&problem);
        let mut f = FEVec::zeros(6);
        f[3] = 5.0;
        let strict = NonlinearControls {
            iterations: 1,
            tolerance: 1e-300,
            load_steps: 1,
            relaxation: 0.5,
        };
        assert!(matches!(
            static_nonlinear_displacements(&problem, &condensation, &f, &strict),
            Err(FeltError::ConvergenceFailed(1))
        ));
    }

    #[test]
    fn test_singular_tangent_is_not_a_convergence_failure() {
        // Without the roller the bar has no transverse stiffness at node 2
        let mut problem = bar();
        problem.nodes[1].constraint = None;
        find_active_dofs(&mut problem).unwrap();
        let condensation = Condensation::new(&problem);
        let mut f = FEVec::zeros(6);
        f[3] = 5.0;
        assert!(matches!(
            static_nonlinear_displacements(&problem, &condensation, &f, &controls()),
            Err(FeltError::SingularMatrix)
        ));
    }
}
