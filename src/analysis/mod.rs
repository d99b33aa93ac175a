//! Analysis types and parameters

use serde::{Deserialize, Serialize};

use crate::definitions::Domain;
use crate::dofs::Dof;
use crate::model::Problem;

/// Upper bound on the rows of a sweep or time history
pub const MAX_ROWS: usize = 1_000_000;

/// Row count of a sweep whose span covers `steps` steps.
///
/// `None` unless the count is finite, non-negative and within [`MAX_ROWS`].
pub fn row_count(steps: f64) -> Option<usize> {
    if !steps.is_finite() || steps < -1e-9 {
        return None;
    }
    let rows = (steps + 1e-9).floor() + 1.0;
    (rows <= MAX_ROWS as f64).then_some(rows as usize)
}

/// Type of analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Linear static analysis with the problem's forces
    Static,
    /// Linear static analysis repeated for every declared load case
    StaticLoadCases,
    /// Linear static analysis over a range of one input force
    StaticLoadRange,
    /// Nonlinear static analysis by successive substitution
    StaticSubstitution,
    /// Nonlinear static analysis by incremental loading
    StaticIncremental,
    /// Substitution nonlinear analysis over a range of one input force
    StaticSubstitutionLoadRange,
    /// Incremental nonlinear analysis over a range of one input force
    StaticIncrementalLoadRange,
    /// Steady-state heat conduction
    StaticThermal,
    /// Structural time integration
    Transient,
    /// Heat conduction time integration
    TransientThermal,
    /// Natural frequencies and mode shapes
    Modal,
    /// Random vibration (transfer functions and output spectra)
    Spectral,
}

impl Default for AnalysisType {
    fn default() -> Self {
        Self::Static
    }
}

impl AnalysisType {
    /// Element domain this analysis works on
    pub fn domain(self) -> Domain {
        match self {
            Self::StaticThermal | Self::TransientThermal => Domain::Thermal,
            _ => Domain::Structural,
        }
    }

    /// Whether the stiffness depends on the current displacement
    pub fn is_nonlinear(self) -> bool {
        matches!(
            self,
            Self::StaticSubstitution
                | Self::StaticIncremental
                | Self::StaticSubstitutionLoadRange
                | Self::StaticIncrementalLoadRange
        )
    }

    /// Whether the analysis needs mass (and damping) matrices
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            Self::Transient | Self::TransientThermal | Self::Modal | Self::Spectral
        )
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::StaticLoadCases => "static load cases",
            Self::StaticLoadRange => "static load range",
            Self::StaticSubstitution => "static substitution",
            Self::StaticIncremental => "static incremental",
            Self::StaticSubstitutionLoadRange => "static substitution load range",
            Self::StaticIncrementalLoadRange => "static incremental load range",
            Self::StaticThermal => "static thermal",
            Self::Transient => "transient",
            Self::TransientThermal => "transient thermal",
            Self::Modal => "modal",
            Self::Spectral => "spectral",
        }
    }
}

/// Mass matrix formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassMode {
    Consistent,
    Lumped,
}

impl Default for MassMode {
    fn default() -> Self {
        Self::Consistent
    }
}

/// Parameters controlling the analysis
///
/// `start`, `stop` and `step` describe the time axis (transient), the
/// frequency axis in rad/s (spectral) or the input force range (load range).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    /// Type of analysis
    pub mode: AnalysisType,
    pub start: f64,
    pub stop: f64,
    /// Zero selects the adaptive integrator in structural transient analysis
    pub step: f64,
    /// Newmark gamma
    pub gamma: f64,
    /// Newmark beta
    pub beta: f64,
    /// Implicitness of the thermal integrator (0 explicit, 0.5 Crank-Nicolson, 1 backward Euler)
    pub alpha: f64,
    pub mass_mode: MassMode,
    /// Node numbers reported in result tables
    pub nodes: Vec<u32>,
    /// DOFs reported in result tables
    pub dofs: Vec<Dof>,
    /// Maximum iterations for nonlinear analysis
    pub iterations: usize,
    /// Convergence tolerance (nonlinear) or local error tolerance (adaptive integration)
    pub tolerance: f64,
    /// Number of load increments in nonlinear analysis
    pub load_steps: usize,
    /// Relaxation factor for substitution updates
    pub relaxation: f64,
    /// Node carrying the ranged force
    pub input_node: Option<u32>,
    /// DOF of the ranged force
    pub input_dof: Option<Dof>,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            mode: AnalysisType::Static,
            start: 0.0,
            stop: 0.0,
            step: 0.0,
            gamma: 0.5,
            beta: 0.25,
            alpha: 0.5,
            mass_mode: MassMode::Consistent,
            nodes: Vec::new(),
            dofs: Vec::new(),
            iterations: 50,
            tolerance: 1e-6,
            load_steps: 1,
            relaxation: 1.0,
            input_node: None,
            input_dof: None,
        }
    }
}

impl AnalysisParameters {
    /// Create parameters for a given analysis type
    pub fn new(mode: AnalysisType) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the time, frequency or force axis
    pub fn with_range(mut self, start: f64, stop: f64, step: f64) -> Self {
        self.start = start;
        self.stop = stop;
        self.step = step;
        self
    }

    /// Set the reported nodes and DOFs
    pub fn with_outputs(mut self, nodes: &[u32], dofs: &[Dof]) -> Self {
        self.nodes = nodes.to_vec();
        self.dofs = dofs.to_vec();
        self
    }

    /// Set the ranged input force
    pub fn with_input(mut self, node: u32, dof: Dof) -> Self {
        self.input_node = Some(node);
        self.input_dof = Some(dof);
        self
    }

    /// Set iteration controls for nonlinear analysis
    pub fn with_iterations(mut self, iterations: usize, tolerance: f64) -> Self {
        self.iterations = iterations;
        self.tolerance = tolerance;
        self
    }

    /// Number of rows produced by a `start..=stop` sweep with `step`
    ///
    /// Zero for a range that cannot be swept, see [`row_count`].
    pub fn num_steps(&self) -> usize {
        if self.step == 0.0 {
            return 0;
        }
        row_count((self.stop - self.start) / self.step).unwrap_or(0)
    }

    fn check_row_limit(&self, steps: f64, errors: &mut Vec<String>) {
        if row_count(steps).is_none() {
            errors.push(format!("step {:e} gives more than {} rows", self.step, MAX_ROWS));
        }
    }

    /// Abscissa of sweep row `i`
    pub fn sweep_value(&self, i: usize) -> f64 {
        self.start + i as f64 * self.step
    }

    /// Check the parameters required by `mode`, returning the number of errors.
    ///
    /// Every error is logged as it is found.
    pub fn validate(&self, mode: AnalysisType, problem: &Problem) -> usize {
        let mut errors: Vec<String> = Vec::new();

        for element in &problem.elements {
            if element.definition.domain != mode.domain() {
                errors.push(format!(
                    "element {} ({}) cannot be used in {} analysis",
                    element.number,
                    element.definition.name,
                    mode.label()
                ));
            }
        }

        let needs_outputs = !matches!(
            mode,
            AnalysisType::Static
                | AnalysisType::StaticThermal
                | AnalysisType::StaticSubstitution
                | AnalysisType::StaticIncremental
                | AnalysisType::Modal
        );
        if needs_outputs {
            if self.nodes.is_empty() {
                errors.push("no output nodes specified".to_string());
            }
            if self.dofs.is_empty() {
                errors.push("no output DOFs specified".to_string());
            }
            for &number in &self.nodes {
                if problem.node_id(number).is_none() {
                    errors.push(format!("output node {} does not exist", number));
                }
            }
            for &dof in &self.dofs {
                if !problem.dof_map().is_active(dof) {
                    errors.push(format!("output DOF {} is not active in this problem", dof));
                }
            }
        }

        match mode {
            AnalysisType::Transient => {
                if self.stop <= 0.0 {
                    errors.push("transient analysis needs a positive stop time".to_string());
                }
                if self.step < 0.0 {
                    errors.push("time step cannot be negative".to_string());
                }
                if self.beta <= 0.0 || self.gamma < 0.5 {
                    errors.push(format!(
                        "invalid Newmark parameters (gamma = {}, beta = {})",
                        self.gamma, self.beta
                    ));
                }
                if self.step == 0.0 && self.tolerance <= 0.0 {
                    errors.push("adaptive integration needs a positive tolerance".to_string());
                }
                if self.step > 0.0 && self.stop > 0.0 {
                    self.check_row_limit(self.stop / self.step, &mut errors);
                }
            }
            AnalysisType::TransientThermal => {
                if self.stop <= 0.0 {
                    errors.push("transient analysis needs a positive stop time".to_string());
                }
                if self.step <= 0.0 {
                    errors.push("thermal integration needs a positive time step".to_string());
                }
                if !(0.0..=1.0).contains(&self.alpha) {
                    errors.push(format!("alpha must lie in [0, 1], got {}", self.alpha));
                }
                if self.step > 0.0 && self.stop > 0.0 {
                    self.check_row_limit(self.stop / self.step, &mut errors);
                }
            }
            AnalysisType::Spectral => {
                if self.start < 0.0 {
                    errors.push("spectral start frequency cannot be negative".to_string());
                }
                if self.step <= 0.0 || self.stop < self.start {
                    errors.push("invalid frequency range".to_string());
                } else {
                    self.check_row_limit((self.stop - self.start) / self.step, &mut errors);
                }
            }
            AnalysisType::StaticLoadCases => {
                if problem.load_cases.is_empty() {
                    errors.push("no load cases defined".to_string());
                }
            }
            AnalysisType::StaticLoadRange
            | AnalysisType::StaticSubstitutionLoadRange
            | AnalysisType::StaticIncrementalLoadRange => {
                self.validate_input_force(problem, &mut errors);
                let steps = (self.stop - self.start) / self.step;
                if self.step == 0.0 || steps < -1e-9 {
                    errors.push("invalid load range".to_string());
                } else {
                    self.check_row_limit(steps, &mut errors);
                }
            }
            _ => {}
        }

        if mode.is_nonlinear() {
            if self.iterations == 0 {
                errors.push("nonlinear analysis needs at least one iteration".to_string());
            }
            if self.tolerance <= 0.0 {
                errors.push("nonlinear tolerance must be positive".to_string());
            }
            if self.load_steps == 0 {
                errors.push("nonlinear analysis needs at least one load step".to_string());
            }
            if self.relaxation <= 0.0 || self.relaxation > 1.0 {
                errors.push(format!("relaxation must lie in (0, 1], got {}", self.relaxation));
            }
        }

        for message in &errors {
            log::error!("{}", message);
        }
        errors.len()
    }

    fn validate_input_force(&self, problem: &Problem, errors: &mut Vec<String>) {
        match self.input_node {
            Some(number) if problem.node_id(number).is_none() => {
                errors.push(format!("input node {} does not exist", number));
            }
            None => errors.push("no input node specified for load range".to_string()),
            _ => {}
        }
        match self.input_dof {
            Some(dof) if !problem.dof_map().is_active(dof) => {
                errors.push(format!("input DOF {} is not active in this problem", dof));
            }
            None => errors.push("no input DOF specified for load range".to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_steps_is_inclusive() {
        let params = AnalysisParameters::new(AnalysisType::StaticLoadRange).with_range(0.0, 100.0, 25.0);
        assert_eq!(params.num_steps(), 5);
        assert_eq!(params.sweep_value(4), 100.0);

        let descending = AnalysisParameters::default().with_range(10.0, 0.0, -5.0);
        assert_eq!(descending.num_steps(), 3);

        let wrong_sign = AnalysisParameters::default().with_range(0.0, 10.0, -1.0);
        assert_eq!(wrong_sign.num_steps(), 0);

        let tiny = AnalysisParameters::default().with_range(0.0, 1.0, 1e-300);
        assert_eq!(tiny.num_steps(), 0);
    }

    #[test]
    fn test_row_count_limits() {
        assert_eq!(row_count(4.0), Some(5));
        assert_eq!(row_count(-1.0), None);
        assert_eq!(row_count(f64::INFINITY), None);
        assert_eq!(row_count(f64::NAN), None);
        assert_eq!(row_count(1e300), None);
        assert_eq!(row_count((MAX_ROWS - 1) as f64), Some(MAX_ROWS));
        assert_eq!(row_count(MAX_ROWS as f64), None);
    }

    #[test]
    fn test_mode_properties() {
        assert_eq!(AnalysisType::TransientThermal.domain(), Domain::Thermal);
        assert!(AnalysisType::StaticIncrementalLoadRange.is_nonlinear());
        assert!(AnalysisType::Spectral.is_dynamic());
        assert!(!AnalysisType::StaticLoadCases.is_dynamic());
    }

    #[test]
    fn test_mode_deserializes_snake_case() {
        let params: AnalysisParameters =
            serde_json::from_str(r#"{"mode": "static_load_range", "stop": 10.0}"#).unwrap();
        assert_eq!(params.mode, AnalysisType::StaticLoadRange);
        assert_eq!(params.beta, 0.25);
    }
}
