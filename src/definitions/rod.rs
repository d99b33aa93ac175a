//! One-dimensional axial rod

use super::{Definition, Domain, ElementContext, ElementKernel};
use crate::analysis::MassMode;
use crate::dofs::Dof;
use crate::error::FeltResult;
use crate::loads::LoadDirection;
use crate::math::{Mat, Vec as FEVec};

/// Two-node bar carrying axial force only, with a single `Tx` DOF per node
#[derive(Debug, Default)]
pub struct RodKernel;

pub(super) fn definition() -> Definition {
    Definition::new("rod", 2, &[Dof::Tx], Domain::Structural, Box::new(RodKernel)).with_loads()
}

impl ElementKernel for RodKernel {
    fn stiffness(&self, ctx: &ElementContext) -> FeltResult<Mat> {
        let (length, _) = ctx.axis()?;
        let e = ctx.require("E", ctx.material.e)?;
        let a = ctx.require("A", ctx.material.a)?;
        let k = e * a / length;
        Ok(Mat::from_row_slice(2, 2, &[k, -k, -k, k]))
    }

    fn mass(&self, ctx: &ElementContext, mode: MassMode) -> FeltResult<Mat> {
        let (length, _) = ctx.axis()?;
        let m = ctx.material.rho * ctx.material.a * length;
        Ok(match mode {
            MassMode::Consistent => {
                Mat::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]) * (m / 6.0)
            }
            MassMode::Lumped => Mat::identity(2, 2) * (m / 2.0),
        })
    }

    fn equivalent_loads(&self, ctx: &ElementContext) -> FeltResult<Option<FEVec>> {
        if ctx.loads.is_empty() {
            return Ok(None);
        }
        let (length, _) = ctx.axis()?;
        let mut f = FEVec::zeros(2);
        for load in ctx.loads {
            if !matches!(load.direction, LoadDirection::Parallel | LoadDirection::GlobalX) {
                return Err(ctx.invalid(format!(
                    "rod elements only take parallel loads ({} is {:?})",
                    load.name, load.direction
                )));
            }
            f[0] += length * (2.0 * load.w1 + load.w2) / 6.0;
            f[1] += length * (load.w1 + 2.0 * load.w2) / 6.0;
        }
        Ok(Some(f))
    }

    /// Axial force and axial stress
    fn stresses(&self, ctx: &ElementContext, values: &[f64]) -> FeltResult<Vec<f64>> {
        let (length, _) = ctx.axis()?;
        let e = ctx.require("E", ctx.material.e)?;
        let a = ctx.require("A", ctx.material.a)?;
        let strain = (values[1] - values[0]) / length;
        Ok(vec![e * a * strain, e * strain])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use crate::loads::DistributedLoad;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn context<'a>(material: &'a Material, loads: &'a [Arc<DistributedLoad>]) -> ElementContext<'a> {
        ElementContext {
            number: 1,
            coords: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            material,
            loads,
            displacement: None,
        }
    }

    #[test]
    fn test_rod_stiffness_and_stress() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0);
        let ctx = context(&material, &[]);
        let k = RodKernel.stiffness(&ctx).unwrap();
        assert_relative_eq!(k[(0, 0)], 1e9, max_relative = 1e-12);
        assert_relative_eq!(k[(0, 1)], -1e9, max_relative = 1e-12);

        let stress = RodKernel.stresses(&ctx, &[0.0, 1e-3]).unwrap();
        assert_relative_eq!(stress[0], 1e6, max_relative = 1e-12);
        assert_relative_eq!(stress[1], 1e8, max_relative = 1e-12);
    }

    #[test]
    fn test_rod_mass_total() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0);
        let ctx = context(&material, &[]);
        for mode in [MassMode::Consistent, MassMode::Lumped] {
            let m = RodKernel.mass(&ctx, mode).unwrap();
            assert_relative_eq!(m.sum(), 7850.0 * 0.01 * 2.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_rod_triangular_load() {
        let material = Material::elastic("steel", 200e9, 0.01, 7850.0);
        let loads = vec![Arc::new(DistributedLoad::new("w", LoadDirection::Parallel, 0.0, 6.0))];
        let ctx = context(&material, &loads);
        let f = RodKernel.equivalent_loads(&ctx).unwrap().unwrap();
        assert_relative_eq!(f[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(f[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_area_is_reported() {
        let material = Material::new("bare");
        let ctx = context(&material, &[]);
        assert!(RodKernel.stiffness(&ctx).is_err());
    }
}
