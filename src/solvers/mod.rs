//! Numerical solvers working on condensed global systems
//!
//! Hard failures (singular systems, integration breakdown, non-convergence)
//! are signalled with `None`; the analysis pipeline turns them into errors.

pub mod linear;
pub mod modal;
pub mod nonlinear;
pub mod spectral;
pub mod transient;

pub use linear::{solve_displacements, solve_many};
pub use modal::{compute_eigen_modes, form_modal_matrices, normalize_by_first};
pub use nonlinear::{solve_nonlinear_load_range, static_nonlinear_displacements, NonlinearControls};
pub use spectral::{compute_output_spectra, compute_transfer_functions, find_forced_dofs, ForcedDof};
pub use transient::{integrate_adaptive, integrate_hyperbolic, integrate_parabolic, DynamicSystem, Newmark};
