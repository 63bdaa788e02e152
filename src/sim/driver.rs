use anyhow::Result;

use super::job::Workload;
use crate::core::{Report, SimCore, SimEvent};

pub struct Sim {
    pub core: SimCore,
}

impl Sim {
    pub fn new(workload: Workload) -> Result<Self> {
        workload.validate()?;
        let mut core = SimCore::new(workload.max_cores);
        for def in workload.processes {
            core.submit(def.pid, def.arrival_time, def.instructions);
        }
        Ok(Self { core })
    }

    pub fn step(&mut self) -> Vec<SimEvent> {
        self.core.step()
    }

    /// Step until every process has terminated, returning all events.
    pub fn run(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        while !self.all_processes_completed() {
            events.extend(self.step());
        }
        events
    }

    pub fn all_processes_completed(&self) -> bool {
        self.core.is_finished()
    }

    pub fn report(&self) -> Report {
        self.core.state.stats.report()
    }
}
