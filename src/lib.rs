pub mod core;
pub mod sim;

pub use crate::core::{Report, Resource, SimEvent};
pub use sim::{ProcessDef, Sim, Workload};
