use anyhow::{Result, bail, ensure};
use rustc_hash::FxHashSet;

use crate::core::state::{Instruction, Pid, Resource, Ticks};

/// One process as supplied by the input feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDef {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub max_cores: usize,
    pub processes: Vec<ProcessDef>,
}

impl ProcessDef {
    pub fn new(pid: Pid, arrival_time: Ticks) -> Self {
        Self {
            pid,
            arrival_time,
            instructions: Vec::new(),
        }
    }

    pub fn step(mut self, resource: Resource, duration: Ticks) -> Self {
        self.instructions.push(Instruction { resource, duration });
        self
    }

    pub fn core(self, duration: Ticks) -> Self {
        self.step(Resource::Core, duration)
    }

    pub fn ssd(self, duration: Ticks) -> Self {
        self.step(Resource::Ssd, duration)
    }

    pub fn tty(self, duration: Ticks) -> Self {
        self.step(Resource::Tty, duration)
    }

    /// CORE bursts must alternate with SSD/TTY steps, starting with a CORE
    /// burst. An empty sequence is allowed.
    pub fn validate(&self) -> Result<()> {
        for (i, instr) in self.instructions.iter().enumerate() {
            let expect_core = i % 2 == 0;
            match (expect_core, instr.resource) {
                (true, Resource::Core) | (false, Resource::Ssd | Resource::Tty) => {}
                (true, other) => bail!(
                    "process {}: instruction {} is {other}, expected CORE",
                    self.pid,
                    i + 1
                ),
                (false, _) => bail!(
                    "process {}: instruction {} is CORE right after another CORE",
                    self.pid,
                    i + 1
                ),
            }
        }
        Ok(())
    }
}

impl Workload {
    pub fn new(max_cores: usize) -> Self {
        Self {
            max_cores,
            processes: Vec::new(),
        }
    }

    pub fn process(mut self, def: ProcessDef) -> Self {
        self.processes.push(def);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_cores > 0, "at least one core is required");
        let mut seen = FxHashSet::default();
        for def in &self.processes {
            ensure!(seen.insert(def.pid), "duplicate PID {}", def.pid);
            def.validate()?;
        }

        // Every hold starts no later than the last arrival plus all work
        // before it, so this bounds the clock
        let latest_arrival = self.processes.iter().map(|d| d.arrival_time).max();
        let horizon = self
            .processes
            .iter()
            .flat_map(|d| &d.instructions)
            .try_fold(latest_arrival.unwrap_or(0), |t, i| t.checked_add(i.duration));
        ensure!(
            horizon.is_some(),
            "instruction durations overflow the logical clock"
        );
        Ok(())
    }
}
