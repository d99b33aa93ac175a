//! Material properties

use serde::{Deserialize, Serialize};

/// Material properties shared by elements
///
/// Every property defaults to zero; element formulations report an error when a
/// property they need is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Modulus of elasticity (Young's modulus)
    pub e: f64,
    /// Cross-sectional area
    pub a: f64,
    /// Moment of inertia about the bending axis
    pub ix: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Shear modulus
    pub g: f64,
    /// Thickness of planar elements
    pub t: f64,
    /// Mass density
    pub rho: f64,
    /// Thermal conductivity
    pub kappa: f64,
    /// Specific heat capacity
    pub c: f64,
    /// Stiffness-proportional Rayleigh damping coefficient
    pub rk: f64,
    /// Mass-proportional Rayleigh damping coefficient
    pub rm: f64,
}

impl Material {
    /// Create a named material with no properties set
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Create a bar/beam material from modulus, area and density
    pub fn elastic(name: &str, e: f64, a: f64, rho: f64) -> Self {
        Self {
            e,
            a,
            rho,
            ..Self::new(name)
        }
    }

    /// Create a conduction material
    pub fn thermal(name: &str, kappa: f64, rho: f64, c: f64) -> Self {
        Self {
            kappa,
            rho,
            c,
            t: 1.0,
            ..Self::new(name)
        }
    }

    /// Set the moment of inertia
    pub fn with_inertia(mut self, ix: f64) -> Self {
        self.ix = ix;
        self
    }

    /// Set the thickness
    pub fn with_thickness(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    /// Set Rayleigh damping coefficients (C = rk K + rm M)
    pub fn with_damping(mut self, rk: f64, rm: f64) -> Self {
        self.rk = rk;
        self.rm = rm;
        self
    }

    /// Whether the material contributes damping
    pub fn is_damped(&self) -> bool {
        self.rk != 0.0 || self.rm != 0.0
    }
}
