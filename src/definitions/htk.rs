//! Linear triangle for steady and transient heat conduction

use super::{Definition, Domain, ElementContext, ElementKernel};
use crate::analysis::MassMode;
use crate::dofs::Dof;
use crate::error::FeltResult;
use crate::math::Mat;

/// Three-node conduction triangle; the temperature is carried in `Tx`
#[derive(Debug, Default)]
pub struct HeatTriangleKernel;

pub(super) fn definition() -> Definition {
    Definition::new(
        "htk",
        3,
        &[Dof::Tx],
        Domain::Thermal,
        Box::new(HeatTriangleKernel),
    )
}

/// Shape function derivative coefficients and signed area
struct Geometry {
    b: [f64; 3],
    c: [f64; 3],
    area: f64,
}

impl Geometry {
    fn new(ctx: &ElementContext) -> FeltResult<Self> {
        let [x1, y1, _] = ctx.coords[0];
        let [x2, y2, _] = ctx.coords[1];
        let [x3, y3, _] = ctx.coords[2];

        let b = [y2 - y3, y3 - y1, y1 - y2];
        let c = [x3 - x2, x1 - x3, x2 - x1];
        let area = 0.5 * (x2 * y3 - x3 * y2 + x3 * y1 - x1 * y3 + x1 * y2 - x2 * y1);
        if area.abs() < 1e-12 {
            return Err(ctx.invalid("triangle has zero area"));
        }
        Ok(Self { b, c, area })
    }
}

impl ElementKernel for HeatTriangleKernel {
    fn stiffness(&self, ctx: &ElementContext) -> FeltResult<Mat> {
        let geometry = Geometry::new(ctx)?;
        let kappa = ctx.require("kappa", ctx.material.kappa)?;
        let t = ctx.require("t", ctx.material.t)?;
        let factor = kappa * t / (4.0 * geometry.area.abs());
        Ok(Mat::from_fn(3, 3, |i, j| {
            factor * (geometry.b[i] * geometry.b[j] + geometry.c[i] * geometry.c[j])
        }))
    }

    fn mass(&self, ctx: &ElementContext, mode: MassMode) -> FeltResult<Mat> {
        let geometry = Geometry::new(ctx)?;
        let capacity = ctx.material.rho * ctx.material.c * ctx.material.t * geometry.area.abs();
        Ok(match mode {
            MassMode::Consistent => {
                Mat::from_fn(3, 3, |i, j| if i == j { 2.0 } else { 1.0 }) * (capacity / 12.0)
            }
            MassMode::Lumped => Mat::identity(3, 3) * (capacity / 3.0),
        })
    }

    /// Heat flux [qx, qy]
    fn stresses(&self, ctx: &ElementContext, values: &[f64]) -> FeltResult<Vec<f64>> {
        let geometry = Geometry::new(ctx)?;
        let kappa = ctx.require("kappa", ctx.material.kappa)?;
        let two_area = 2.0 * geometry.area;
        let dtdx: f64 = (0..3).map(|i| geometry.b[i] * values[i]).sum::<f64>() / two_area;
        let dtdy: f64 = (0..3).map(|i| geometry.c[i] * values[i]).sum::<f64>() / two_area;
        Ok(vec![-kappa * dtdx, -kappa * dtdy])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use approx::assert_relative_eq;

    fn triangle(material: &Material) -> ElementContext<'_> {
        ElementContext {
            number: 1,
            coords: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            material,
            loads: &[],
            displacement: None,
        }
    }

    #[test]
    fn test_conductance_rows_sum_to_zero() {
        let material = Material::thermal("copper", 400.0, 8900.0, 385.0);
        let k = HeatTriangleKernel.stiffness(&triangle(&material)).unwrap();
        for i in 0..3 {
            assert_relative_eq!(k.row(i).sum(), 0.0, epsilon = 1e-9);
        }
        assert!(k[(0, 0)] > 0.0);
    }

    #[test]
    fn test_capacity_totals() {
        let material = Material::thermal("copper", 400.0, 8900.0, 385.0);
        let total = 8900.0 * 385.0 * 1.0;
        for mode in [MassMode::Consistent, MassMode::Lumped] {
            let m = HeatTriangleKernel.mass(&triangle(&material), mode).unwrap();
            assert_relative_eq!(m.sum(), total, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_linear_temperature_gives_uniform_flux() {
        let material = Material::thermal("copper", 400.0, 8900.0, 385.0);
        // T = 10 x
        let q = HeatTriangleKernel
            .stresses(&triangle(&material), &[0.0, 20.0, 0.0])
            .unwrap();
        assert_relative_eq!(q[0], -4000.0, max_relative = 1e-12);
        assert_relative_eq!(q[1], 0.0, epsilon = 1e-9);
    }
}
