use average::{Estimate, Mean};

use super::state::Ticks;

/// Running totals, updated as resources are granted and processes finish.
#[derive(Debug)]
pub struct Stats {
    pub busy_core_time: Ticks,
    pub ssd_busy_time: Ticks,
    pub ssd_accesses: u64,
    pub completed_processes: u64,
    pub simulated_time: Ticks,
    turnaround: Mean,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            busy_core_time: 0,
            ssd_busy_time: 0,
            ssd_accesses: 0,
            completed_processes: 0,
            simulated_time: 0,
            turnaround: Mean::new(),
        }
    }
}

/// Final figures produced once the last process terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub simulated_time: Ticks,
    pub ssd_accesses: u64,
    pub completed_processes: u64,
    pub average_busy_cores: f64,
    pub ssd_utilization: f64,
    pub mean_turnaround: f64,
}

impl Stats {
    pub fn record_completion(&mut self, arrival_time: Ticks, completion_time: Ticks) {
        self.completed_processes += 1;
        self.turnaround
            .add(completion_time.saturating_sub(arrival_time) as f64);
    }

    pub fn report(&self) -> Report {
        Report {
            simulated_time: self.simulated_time,
            ssd_accesses: self.ssd_accesses,
            completed_processes: self.completed_processes,
            average_busy_cores: ratio(self.busy_core_time, self.simulated_time),
            ssd_utilization: ratio(self.ssd_busy_time, self.simulated_time),
            mean_turnaround: self.turnaround.estimate(),
        }
    }
}

// A run that ends at t=0 has done no work
fn ratio(busy: Ticks, elapsed: Ticks) -> f64 {
    if elapsed == 0 {
        0.0
    } else {
        busy as f64 / elapsed as f64
    }
}
