use crate::core::{Container, Pid, ProcessState, Report, Resource, Ticks};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Admitted {
        pid: Pid,
        time: Ticks,
        state: ProcessState,
    },
    Granted {
        pid: Pid,
        resource: Resource,
        start: Ticks,
        end: Ticks,
    },
    // Parked behind the current SSD holder
    SsdWait {
        pid: Pid,
        time: Ticks,
    },
    Released {
        pid: Pid,
        resource: Resource,
        time: Ticks,
    },
    // The process left the system at `time`
    Terminated {
        pid: Pid,
        time: Ticks,
    },
    // Surfaced by the driver once the system around the termination settled
    TerminationNotice {
        pid: Pid,
    },
    Snapshot(Snapshot),
    Finished(Report),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub pid: Pid,
    pub state: ProcessState,
    pub container: Container,
}

/// Every admitted process, listed interactive queue first, then active holds
/// in completion order, then the non-interactive and SSD wait queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub time: Ticks,
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn find(&self, pid: Pid) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.pid == pid)
    }
}
