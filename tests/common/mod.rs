#![allow(dead_code)]

use proc_model::core::{Pid, Resource, SimEvent, Ticks};
use proc_model::{Report, Sim, Workload};
use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`. Safe to call from every test.
pub fn setup_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run a workload to completion and return its events and final report.
pub fn run(workload: Workload) -> (Vec<SimEvent>, Report) {
    setup_test();
    let mut sim = Sim::new(workload).expect("workload should be valid");
    let events = sim.run();
    let report = events
        .iter()
        .find_map(|e| match e {
            SimEvent::Finished(report) => Some(report.clone()),
            _ => None,
        })
        .expect("simulation finished without a report");
    (events, report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub pid: Pid,
    pub resource: Resource,
    pub start: Ticks,
    pub end: Ticks,
}

pub fn grants(events: &[SimEvent]) -> Vec<Grant> {
    events
        .iter()
        .filter_map(|e| match *e {
            SimEvent::Granted {
                pid,
                resource,
                start,
                end,
            } => Some(Grant {
                pid,
                resource,
                start,
                end,
            }),
            _ => None,
        })
        .collect()
}

/// (resource, start, end) of every hold a process was given, in order.
pub fn holds_of(events: &[SimEvent], pid: Pid) -> Vec<(Resource, Ticks, Ticks)> {
    grants(events)
        .into_iter()
        .filter(|g| g.pid == pid)
        .map(|g| (g.resource, g.start, g.end))
        .collect()
}

pub fn terminated_at(events: &[SimEvent], pid: Pid) -> Option<Ticks> {
    events.iter().find_map(|e| match *e {
        SimEvent::Terminated { pid: p, time } if p == pid => Some(time),
        _ => None,
    })
}

pub fn termination_count(events: &[SimEvent], pid: Pid) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::Terminated { pid: p, .. } if *p == pid))
        .count()
}
