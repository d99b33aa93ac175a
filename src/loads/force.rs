//! Nodal forces - constant or time-varying, with optional input spectra

use serde::{Deserialize, Serialize};

use crate::dofs::Dof;

/// A scalar forcing term
///
/// Deserializes from either a number or a list of `[abscissa, value]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Forcing {
    /// The same value at every time or frequency
    Constant(f64),
    /// Piecewise-linear table, zero outside its abscissa range
    Table(Vec<(f64, f64)>),
}

impl Forcing {
    /// Evaluate the forcing at time (or frequency) `x`
    pub fn value_at(&self, x: f64) -> f64 {
        match self {
            Forcing::Constant(value) => *value,
            Forcing::Table(points) => interpolate(points, x),
        }
    }
}

fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    match points {
        [] => 0.0,
        [(x0, v0)] => {
            if (x - x0).abs() < 1e-12 {
                *v0
            } else {
                0.0
            }
        }
        _ => {
            for pair in points.windows(2) {
                let (x0, v0) = pair[0];
                let (x1, v1) = pair[1];
                if x >= x0 && x <= x1 {
                    if (x1 - x0).abs() < 1e-15 {
                        return v1;
                    }
                    return v0 + (v1 - v0) * (x - x0) / (x1 - x0);
                }
            }
            0.0
        }
    }
}

/// A named nodal force template shared by any number of nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Force {
    /// Force name
    pub name: String,
    /// Forcing per DOF, indexed by [`Dof::index`]
    pub components: [Option<Forcing>; 6],
    /// Input power spectrum per DOF for spectral analysis
    pub spectra: [Option<Forcing>; 6],
}

impl Force {
    /// Create a force with no components
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set a constant component
    pub fn with_component(mut self, dof: Dof, value: f64) -> Self {
        self.components[dof.index()] = Some(Forcing::Constant(value));
        self
    }

    /// Set a time-varying component
    pub fn with_history(mut self, dof: Dof, points: Vec<(f64, f64)>) -> Self {
        self.components[dof.index()] = Some(Forcing::Table(points));
        self
    }

    /// Set an input power spectrum for a DOF
    pub fn with_spectrum(mut self, dof: Dof, spectrum: Forcing) -> Self {
        self.spectra[dof.index()] = Some(spectrum);
        self
    }

    /// Magnitude of a component at time `t`
    pub fn magnitude(&self, dof: Dof, t: f64) -> f64 {
        self.components[dof.index()]
            .as_ref()
            .map_or(0.0, |forcing| forcing.value_at(t))
    }

    /// Input spectrum of a DOF at frequency `omega`
    pub fn spectrum(&self, dof: Dof, omega: f64) -> f64 {
        self.spectra[dof.index()]
            .as_ref()
            .map_or(0.0, |forcing| forcing.value_at(omega))
    }

    /// Whether a DOF carries an input spectrum
    pub fn has_spectrum(&self, dof: Dof) -> bool {
        self.spectra[dof.index()].is_some()
    }
}
