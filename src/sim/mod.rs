pub mod driver;
pub mod input;
pub mod job;
pub mod workload;

pub use driver::Sim;
pub use input::parse_workload;
pub use job::{ProcessDef, Workload};
pub use workload::{RandomParams, random_workload};
