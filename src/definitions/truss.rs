//! Three-dimensional pin-jointed truss bar with optional geometric nonlinearity

use super::{Definition, Domain, ElementContext, ElementKernel};
use crate::analysis::MassMode;
use crate::dofs::Dof;
use crate::error::FeltResult;
use crate::math::Mat;

#[derive(Debug, Default)]
pub struct TrussKernel;

pub(super) fn definition() -> Definition {
    Definition::new(
        "truss",
        2,
        &[Dof::Tx, Dof::Ty, Dof::Tz],
        Domain::Structural,
        Box::new(TrussKernel),
    )
    .with_nonlinear()
}

/// Place `block` and its negation in the 6x6 two-node pattern [B -B; -B B]
fn two_node_pattern(block: &Mat) -> Mat {
    let mut k = Mat::zeros(6, 6);
    for i in 0..3 {
        for j in 0..3 {
            let v = block[(i, j)];
            k[(i, j)] = v;
            k[(i + 3, j + 3)] = v;
            k[(i, j + 3)] = -v;
            k[(i + 3, j)] = -v;
        }
    }
    k
}

fn outer(c: &[f64; 3]) -> Mat {
    Mat::from_fn(3, 3, |i, j| c[i] * c[j])
}

/// Deformed length and direction cosines
fn deformed_axis(ctx: &ElementContext, d: &[f64]) -> FeltResult<(f64, [f64; 3])> {
    let a = ctx.coords[0];
    let b = ctx.coords[1];
    let delta = [
        b[0] + d[3] - a[0] - d[0],
        b[1] + d[4] - a[1] - d[1],
        b[2] + d[5] - a[2] - d[2],
    ];
    let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
    if length < 1e-12 {
        return Err(ctx.invalid("element collapsed to zero length"));
    }
    Ok((length, [delta[0] / length, delta[1] / length, delta[2] / length]))
}

impl ElementKernel for TrussKernel {
    fn stiffness(&self, ctx: &ElementContext) -> FeltResult<Mat> {
        let (length, c) = ctx.axis()?;
        let e = ctx.require("E", ctx.material.e)?;
        let a = ctx.require("A", ctx.material.a)?;
        let ea = e * a;

        let Some(d) = ctx.displacement else {
            return Ok(two_node_pattern(&(outer(&c) * (ea / length))));
        };

        // Tangent stiffness on the deformed geometry: material part plus
        // the initial-stress part N/L (I - c c^T)
        let (current, cd) = deformed_axis(ctx, d)?;
        let axial_force = ea * (current - length) / length;
        let cc = outer(&cd);
        let material = &cc * (ea / length);
        let geometric = (Mat::identity(3, 3) - &cc) * (axial_force / current);
        Ok(two_node_pattern(&(material + geometric)))
    }

    fn mass(&self, ctx: &ElementContext, mode: MassMode) -> FeltResult<Mat> {
        let (length, _) = ctx.axis()?;
        let m = ctx.material.rho * ctx.material.a * length;
        Ok(match mode {
            MassMode::Consistent => {
                let mut mass = Mat::zeros(6, 6);
                for i in 0..3 {
                    mass[(i, i)] = m / 3.0;
                    mass[(i + 3, i + 3)] = m / 3.0;
                    mass[(i, i + 3)] = m / 6.0;
                    mass[(i + 3, i)] = m / 6.0;
                }
                mass
            }
            MassMode::Lumped => Mat::identity(6, 6) * (m / 2.0),
        })
    }

    /// Axial force and axial stress
    fn stresses(&self, ctx: &ElementContext, values: &[f64]) -> FeltResult<Vec<f64>> {
        let (length, c) = ctx.axis()?;
        let e = ctx.require("E", ctx.material.e)?;
        let a = ctx.require("A", ctx.material.a)?;
        let elongation: f64 = (0..3).map(|i| c[i] * (values[i + 3] - values[i])).sum();
        let strain = elongation / length;
        Ok(vec![e * a * strain, e * strain])
    }
}
