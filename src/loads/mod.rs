//! Forces, distributed loads and load cases

mod distributed;
mod force;
mod load_case;

pub use distributed::{DistributedLoad, LoadDirection};
pub use force::{Force, Forcing};
pub use load_case::LoadCase;
