pub mod dispatch;
pub mod driver;
pub mod event;
pub mod observer;
pub mod state;
pub mod stats;

pub use driver::{Completion, SimCore};
pub use event::{SimEvent, Snapshot, SnapshotEntry};
pub use state::{
    ActiveHold, Container, HoldOrder, Instruction, Pid, ProcKey, Process, ProcessClass,
    ProcessState, Resource, SimState, Ticks,
};
pub use stats::{Report, Stats};
