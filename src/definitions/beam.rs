//! Two-dimensional Euler-Bernoulli frame element

use super::{Definition, Domain, ElementContext, ElementKernel};
use crate::analysis::MassMode;
use crate::dofs::Dof;
use crate::error::FeltResult;
use crate::math::{plane_frame_transformation, Mat, Vec as FEVec};

/// In-plane beam with axial, transverse and rotational DOFs at each node
#[derive(Debug, Default)]
pub struct BeamKernel;

pub(super) fn definition() -> Definition {
    Definition::new(
        "beam",
        2,
        &[Dof::Tx, Dof::Ty, Dof::Rz],
        Domain::Structural,
        Box::new(BeamKernel),
    )
    .with_loads()
}

/// Local stiffness matrix [u1, v1, theta1, u2, v2, theta2]
fn local_stiffness(e: f64, a: f64, ix: f64, l: f64) -> Mat {
    let ea = e * a / l;
    let ei = e * ix;
    let l2 = l * l;
    let l3 = l2 * l;

    let k1 = 12.0 * ei / l3;
    let k2 = 6.0 * ei / l2;
    let k3 = 4.0 * ei / l;
    let k4 = 2.0 * ei / l;

    #[rustfmt::skip]
    let values = [
         ea,  0.0,  0.0, -ea,  0.0,  0.0,
        0.0,   k1,   k2, 0.0,  -k1,   k2,
        0.0,   k2,   k3, 0.0,  -k2,   k4,
        -ea,  0.0,  0.0,  ea,  0.0,  0.0,
        0.0,  -k1,  -k2, 0.0,   k1,  -k2,
        0.0,   k2,   k4, 0.0,  -k2,   k3,
    ];
    Mat::from_row_slice(6, 6, &values)
}

/// Local consistent mass matrix
fn local_consistent_mass(m: f64, l: f64) -> Mat {
    let l2 = l * l;
    #[rustfmt::skip]
    let values = [
        140.0,        0.0,        0.0,  70.0,        0.0,        0.0,
          0.0,      156.0,   22.0 * l,   0.0,       54.0,  -13.0 * l,
          0.0,   22.0 * l,   4.0 * l2,   0.0,   13.0 * l,  -3.0 * l2,
         70.0,        0.0,        0.0, 140.0,        0.0,        0.0,
          0.0,       54.0,   13.0 * l,   0.0,      156.0,  -22.0 * l,
          0.0,  -13.0 * l,  -3.0 * l2,   0.0,  -22.0 * l,   4.0 * l2,
    ];
    Mat::from_row_slice(6, 6, &values) * (m / 420.0)
}

/// Fixed-end forces of the element loads in local coordinates
fn local_fixed_end_forces(ctx: &ElementContext, c: f64, s: f64, l: f64) -> FEVec {
    let mut f = FEVec::zeros(6);
    for load in ctx.loads {
        let [(p1, p2), (w1, w2)] = load.local_components(c, s);
        f[0] += l * (2.0 * p1 + p2) / 6.0;
        f[3] += l * (p1 + 2.0 * p2) / 6.0;
        f[1] += l * (7.0 * w1 + 3.0 * w2) / 20.0;
        f[2] += l * l * (3.0 * w1 + 2.0 * w2) / 60.0;
        f[4] += l * (3.0 * w1 + 7.0 * w2) / 20.0;
        f[5] -= l * l * (2.0 * w1 + 3.0 * w2) / 60.0;
    }
    f
}

impl BeamKernel {
    fn section(&self, ctx: &ElementContext) -> FeltResult<(f64, f64, f64, f64, Mat)> {
        let (length, cosines) = ctx.axis()?;
        if cosines[2].abs() > 1e-9 {
            return Err(ctx.invalid("beam elements must lie in the x-y plane"));
        }
        let e = ctx.require("E", ctx.material.e)?;
        let a = ctx.require("A", ctx.material.a)?;
        let ix = ctx.require("Ix", ctx.material.ix)?;
        let t = plane_frame_transformation(cosines[0], cosines[1]);
        Ok((length, e, a, ix, t))
    }
}

impl ElementKernel for BeamKernel {
    fn stiffness(&self, ctx: &ElementContext) -> FeltResult<Mat> {
        let (length, e, a, ix, t) = self.section(ctx)?;
        let k_local = local_stiffness(e, a, ix, length);
        Ok(t.transpose() * k_local * t)
    }

    fn mass(&self, ctx: &ElementContext, mode: MassMode) -> FeltResult<Mat> {
        let (length, cosines) = ctx.axis()?;
        let m = ctx.material.rho * ctx.material.a * length;
        match mode {
            MassMode::Consistent => {
                let t = plane_frame_transformation(cosines[0], cosines[1]);
                Ok(t.transpose() * local_consistent_mass(m, length) * t)
            }
            MassMode::Lumped => {
                let rotary = m * length * length / 24.0;
                Ok(Mat::from_diagonal(&FEVec::from_vec(vec![
                    m / 2.0,
                    m / 2.0,
                    rotary,
                    m / 2.0,
                    m / 2.0,
                    rotary,
                ])))
            }
        }
    }

    fn equivalent_loads(&self, ctx: &ElementContext) -> FeltResult<Option<FEVec>> {
        if ctx.loads.is_empty() {
            return Ok(None);
        }
        let (length, cosines) = ctx.axis()?;
        let (c, s) = (cosines[0], cosines[1]);
        let t = plane_frame_transformation(c, s);
        Ok(Some(t.transpose() * local_fixed_end_forces(ctx, c, s, length)))
    }

    /// Local end forces [N1, V1, M1, N2, V2, M2]
    fn stresses(&self, ctx: &ElementContext, values: &[f64]) -> FeltResult<Vec<f64>> {
        let (length, e, a, ix, t) = self.section(ctx)?;
        let d_local = &t * FEVec::from_column_slice(values);
        let mut forces = local_stiffness(e, a, ix, length) * d_local;
        let (c, s) = (t[(0, 0)], t[(0, 1)]);
        forces -= local_fixed_end_forces(ctx, c, s, length);
        Ok(forces.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use crate::loads::{DistributedLoad, LoadDirection};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn horizontal<'a>(material: &'a Material, loads: &'a [Arc<DistributedLoad>]) -> ElementContext<'a> {
        ElementContext {
            number: 1,
            coords: vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
            material,
            loads,
            displacement: None,
        }
    }

    #[test]
    fn test_beam_stiffness_terms() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0).with_inertia(1e-4);
        let k = BeamKernel.stiffness(&horizontal(&material, &[])).unwrap();
        let ei = 200e9 * 1e-4;
        assert_relative_eq!(k[(1, 1)], 12.0 * ei / 64.0, max_relative = 1e-12);
        assert_relative_eq!(k[(2, 2)], 4.0 * ei / 4.0, max_relative = 1e-12);
        assert_relative_eq!(k[(2, 5)], 2.0 * ei / 4.0, max_relative = 1e-12);
        assert_relative_eq!(k[(0, 3)], -200e9 * 0.01 / 4.0, max_relative = 1e-12);
    }

    #[test]
    fn test_rotated_beam_is_symmetric() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0).with_inertia(1e-4);
        let ctx = ElementContext {
            number: 2,
            coords: vec![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]],
            material: &material,
            loads: &[],
            displacement: None,
        };
        let k = BeamKernel.stiffness(&ctx).unwrap();
        assert_relative_eq!((&k - k.transpose()).amax(), 0.0, epsilon = 1e-3);
        let m = BeamKernel.mass(&ctx, MassMode::Consistent).unwrap();
        // Translational mass is preserved by the rotation
        assert_relative_eq!(m[(0, 0)] + m[(0, 3)], 7850.0 * 0.01 * 5.0 / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_uniform_load_fixed_end_forces() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0).with_inertia(1e-4);
        let loads = vec![Arc::new(DistributedLoad::uniform("w", LoadDirection::GlobalY, -10.0))];
        let f = BeamKernel
            .equivalent_loads(&horizontal(&material, &loads))
            .unwrap()
            .unwrap();
        assert_relative_eq!(f[1], -20.0, epsilon = 1e-9);
        assert_relative_eq!(f[2], -10.0 * 16.0 / 12.0, epsilon = 1e-9);
        assert_relative_eq!(f[4], -20.0, epsilon = 1e-9);
        assert_relative_eq!(f[5], 10.0 * 16.0 / 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_beam_end_forces_are_reactions() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0).with_inertia(1e-4);
        let loads = vec![Arc::new(DistributedLoad::uniform("w", LoadDirection::Perpendicular, 5.0))];
        let forces = BeamKernel
            .stresses(&horizontal(&material, &loads), &[0.0; 6])
            .unwrap();
        assert_relative_eq!(forces[1], -10.0, epsilon = 1e-9);
        assert_relative_eq!(forces[4], -10.0, epsilon = 1e-9);
    }
}
