//! Time integration of condensed dynamic systems
//!
//! Structural systems `M a + C v + K d = F(t)` use the Newmark family, with
//! either a fixed step or step doubling for error control. Thermal systems
//! `M dT/dt + K T = F(t)` use the generalized trapezoidal rule.

use crate::analysis::row_count;
use crate::math::{Factorization, Mat, Vec as FEVec};

/// Newmark integration parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Newmark {
    pub gamma: f64,
    pub beta: f64,
}

impl Default for Newmark {
    /// Average acceleration (unconditionally stable)
    fn default() -> Self {
        Self {
            gamma: 0.5,
            beta: 0.25,
        }
    }
}

/// The condensed structural system
#[derive(Debug, Clone, Copy)]
pub struct DynamicSystem<'a> {
    pub k: &'a Mat,
    pub m: &'a Mat,
    pub c: &'a Mat,
}

#[derive(Debug, Clone)]
struct State {
    d: FEVec,
    v: FEVec,
    a: FEVec,
}

impl DynamicSystem<'_> {
    fn initial_state(&self, f0: &FEVec, d0: FEVec, v0: FEVec) -> State {
        let rhs = f0 - self.c * &v0 - self.k * &d0;
        let a = match Factorization::new(self.m).and_then(|m| m.solve(&rhs)) {
            Some(a) => a,
            None => {
                log::warn!("mass matrix is singular, starting from zero acceleration");
                FEVec::zeros(d0.len())
            }
        };
        State { d: d0, v: v0, a }
    }

    fn effective_stiffness(&self, newmark: Newmark, dt: f64) -> Option<Factorization> {
        let (gamma, beta) = (newmark.gamma, newmark.beta);
        let k_hat = self.k + self.c * (gamma / (beta * dt)) + self.m * (1.0 / (beta * dt * dt));
        Factorization::new(&k_hat)
    }

    fn step(
        &self,
        newmark: Newmark,
        k_hat: &Factorization,
        state: &State,
        f_next: &FEVec,
        dt: f64,
    ) -> Option<State> {
        let (gamma, beta) = (newmark.gamma, newmark.beta);
        let State { d, v, a } = state;

        let inertia = d / (beta * dt * dt) + v / (beta * dt) + a * (0.5 / beta - 1.0);
        let damping = d * (gamma / (beta * dt))
            + v * (gamma / beta - 1.0)
            + a * (dt * (0.5 * gamma / beta - 1.0));
        let rhs = f_next + self.m * inertia + self.c * damping;

        let d_next = k_hat.solve(&rhs)?;
        let a_next = (&d_next - d) / (beta * dt * dt) - v / (beta * dt) - a * (0.5 / beta - 1.0);
        let v_next = v + (a * (1.0 - gamma) + &a_next * gamma) * dt;
        Some(State {
            d: d_next,
            v: v_next,
            a: a_next,
        })
    }
}

/// Rows of a fixed-step history over `0..=stop`, including the initial state
fn time_rows(dt: f64, stop: f64) -> Option<usize> {
    if dt <= 0.0 {
        log::error!("time step must be positive, got {}", dt);
        return None;
    }
    let rows = row_count(stop / dt);
    if rows.is_none() {
        log::error!("time step {:e} over {} gives too many steps", dt, stop);
    }
    rows
}

/// Fixed-step Newmark integration from `t = 0` to `stop`.
///
/// Returns one displacement vector per time `i * dt`, including the initial
/// state, or `None` if the effective stiffness is singular.
pub fn integrate_hyperbolic(
    system: DynamicSystem,
    newmark: Newmark,
    force: impl Fn(f64) -> FEVec,
    d0: FEVec,
    v0: FEVec,
    dt: f64,
    stop: f64,
) -> Option<Vec<FEVec>> {
    let rows = time_rows(dt, stop)?;
    let k_hat = system.effective_stiffness(newmark, dt)?;

    let mut state = system.initial_state(&force(0.0), d0, v0);
    let mut table = Vec::with_capacity(rows);
    table.push(state.d.clone());
    for i in 1..rows {
        let t = i as f64 * dt;
        state = system.step(newmark, &k_hat, &state, &force(t), dt)?;
        table.push(state.d.clone());
    }
    Some(table)
}

/// Adaptive Newmark integration using step doubling.
///
/// Each step is taken once with `dt` and twice with `dt / 2`; the step is
/// accepted when the relative difference is within `tolerance`, and the step
/// size grows or shrinks accordingly. Returns the accepted times and
/// displacements, or `None` when the step size collapses.
pub fn integrate_adaptive(
    system: DynamicSystem,
    newmark: Newmark,
    force: impl Fn(f64) -> FEVec,
    d0: FEVec,
    v0: FEVec,
    stop: f64,
    tolerance: f64,
) -> Option<(Vec<f64>, Vec<FEVec>)> {
    let min_dt = stop * 1e-10;
    let mut dt = stop / 100.0;
    let mut t = 0.0;

    let mut state = system.initial_state(&force(0.0), d0, v0);
    let mut times = vec![0.0];
    let mut table = vec![state.d.clone()];

    while t < stop - min_dt {
        dt = dt.min(stop - t);

        let full_k = system.effective_stiffness(newmark, dt)?;
        let half_k = system.effective_stiffness(newmark, dt / 2.0)?;
        let full = system.step(newmark, &full_k, &state, &force(t + dt), dt)?;
        let half = system.step(newmark, &half_k, &state, &force(t + dt / 2.0), dt / 2.0)?;
        let half = system.step(newmark, &half_k, &half, &force(t + dt), dt / 2.0)?;

        let scale = half.d.norm().max(1e-12);
        let error = (&full.d - &half.d).norm() / scale;
        if error <= tolerance {
            t += dt;
            state = half;
            times.push(t);
            table.push(state.d.clone());
            if error < tolerance / 4.0 {
                dt *= 2.0;
            }
        } else {
            dt /= 2.0;
            if dt < min_dt {
                log::error!("time step collapsed at t = {}", t);
                return None;
            }
        }
    }
    log::debug!("adaptive integration took {} steps", times.len() - 1);
    Some((times, table))
}

/// Generalized trapezoidal integration of `M dT/dt + K T = F(t)`.
///
/// `alpha` = 0 is forward Euler, 0.5 Crank-Nicolson and 1 backward Euler.
pub fn integrate_parabolic(
    k: &Mat,
    m: &Mat,
    force: impl Fn(f64) -> FEVec,
    d0: FEVec,
    dt: f64,
    stop: f64,
    alpha: f64,
) -> Option<Vec<FEVec>> {
    let rows = time_rows(dt, stop)?;
    let lhs = Factorization::new(&(m + k * (alpha * dt)))?;
    let rhs_matrix = m - k * ((1.0 - alpha) * dt);

    let mut d = d0;
    let mut f_prev = force(0.0);
    let mut table = Vec::with_capacity(rows);
    table.push(d.clone());
    for i in 1..rows {
        let f_next = force(i as f64 * dt);
        let rhs = &rhs_matrix * &d + (&f_next * alpha + &f_prev * (1.0 - alpha)) * dt;
        d = lhs.solve(&rhs)?;
        table.push(d.clone());
        f_prev = f_next;
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn oscillator() -> (Mat, Mat, Mat) {
        (
            Mat::from_element(1, 1, 4.0 * std::f64::consts::PI.powi(2)),
            Mat::from_element(1, 1, 1.0),
            Mat::zeros(1, 1),
        )
    }

    #[test]
    fn test_free_vibration_period() {
        // omega = 2 pi: after one period the mass is back where it started
        let (k, m, c) = oscillator();
        let system = DynamicSystem { k: &k, m: &m, c: &c };
        let table = integrate_hyperbolic(
            system,
            Newmark::default(),
            |_| FEVec::zeros(1),
            FEVec::from_element(1, 1.0),
            FEVec::zeros(1),
            0.001,
            1.0,
        )
        .unwrap();
        assert_eq!(table.len(), 1001);
        assert_relative_eq!(table[500][0], -1.0, epsilon = 1e-3);
        assert_relative_eq!(table[1000][0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_static_load_is_reached_with_damping() {
        let k = Mat::from_element(1, 1, 100.0);
        let m = Mat::from_element(1, 1, 1.0);
        let c = Mat::from_element(1, 1, 40.0);
        let system = DynamicSystem { k: &k, m: &m, c: &c };
        let (times, table) = integrate_adaptive(
            system,
            Newmark::default(),
            |_| FEVec::from_element(1, 10.0),
            FEVec::zeros(1),
            FEVec::zeros(1),
            5.0,
            1e-4,
        )
        .unwrap();
        assert_eq!(times.len(), table.len());
        assert_relative_eq!(*times.last().unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(table.last().unwrap()[0], 0.1, epsilon = 1e-3);
    }

    #[test]
    fn test_thermal_decay() {
        // dT/dt = -T, exact T = exp(-t)
        let k = Mat::from_element(1, 1, 1.0);
        let m = Mat::from_element(1, 1, 1.0);
        let table = integrate_parabolic(
            &k,
            &m,
            |_| FEVec::zeros(1),
            FEVec::from_element(1, 1.0),
            0.01,
            1.0,
            0.5,
        )
        .unwrap();
        assert_eq!(table.len(), 101);
        assert_relative_eq!(table[100][0], (-1.0f64).exp(), epsilon = 1e-4);
    }

    #[test]
    fn test_vanishing_step_is_refused() {
        let (k, m, c) = oscillator();
        let system = DynamicSystem { k: &k, m: &m, c: &c };
        let hyperbolic = integrate_hyperbolic(
            system,
            Newmark::default(),
            |_| FEVec::zeros(1),
            FEVec::from_element(1, 1.0),
            FEVec::zeros(1),
            1e-300,
            1.0,
        );
        assert!(hyperbolic.is_none());

        let parabolic = integrate_parabolic(
            &k,
            &m,
            |_| FEVec::zeros(1),
            FEVec::from_element(1, 1.0),
            1e-300,
            1.0,
            1.0,
        );
        assert!(parabolic.is_none());
    }
}
