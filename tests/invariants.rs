use std::collections::HashMap;

use proc_model::core::{Pid, Resource, SimEvent, Ticks};
use proc_model::sim::{RandomParams, random_workload};

mod common;

fn params(cores: usize) -> RandomParams {
    RandomParams {
        processes: 40,
        max_cores: cores,
        ..Default::default()
    }
}

/// Every submitted process terminates exactly once, when its last hold ends.
#[test]
fn test_every_process_terminates_once() {
    for seed in 0..30 {
        let workload = random_workload(&params(1 + (seed as usize % 4)), seed);
        let (events, report) = common::run(workload.clone());

        assert_eq!(report.completed_processes, workload.processes.len() as u64);
        for def in &workload.processes {
            assert_eq!(
                common::termination_count(&events, def.pid),
                1,
                "seed {seed}: process {} terminated the wrong number of times",
                def.pid
            );
            let last_end = common::holds_of(&events, def.pid)
                .last()
                .map(|&(_, _, end)| end)
                .unwrap_or(def.arrival_time);
            assert_eq!(
                common::terminated_at(&events, def.pid),
                Some(last_end),
                "seed {seed}: process {} terminated before or after its last hold",
                def.pid
            );
        }
    }
}

/// Each process receives its instructions in order, with their full durations,
/// never before it arrives and never overlapping itself.
#[test]
fn test_holds_follow_instruction_sequence() {
    for seed in 0..30 {
        let workload = random_workload(&params(2), seed);
        let (events, _) = common::run(workload.clone());

        for def in &workload.processes {
            let holds = common::holds_of(&events, def.pid);
            assert_eq!(holds.len(), def.instructions.len(), "seed {seed}");

            let mut prev_end = def.arrival_time;
            for (&(resource, start, end), instr) in holds.iter().zip(&def.instructions) {
                assert_eq!(resource, instr.resource, "seed {seed}");
                assert_eq!(end - start, instr.duration, "seed {seed}");
                assert!(start >= prev_end, "seed {seed}: process {} overlaps itself", def.pid);
                prev_end = end;
            }
        }
    }
}

#[test]
fn test_ssd_holds_never_overlap() {
    for seed in 0..30 {
        let workload = random_workload(&params(3), seed);
        let (events, report) = common::run(workload);

        let mut ssd: Vec<(Ticks, Ticks)> = common::grants(&events)
            .into_iter()
            .filter(|g| g.resource == Resource::Ssd)
            .map(|g| (g.start, g.end))
            .collect();
        assert_eq!(ssd.len() as u64, report.ssd_accesses, "seed {seed}");

        ssd.sort();
        for pair in ssd.windows(2) {
            assert!(
                pair[1].0 >= pair[0].1,
                "seed {seed}: SSD holds {:?} and {:?} overlap",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_core_holds_within_pool() {
    for seed in 0..30 {
        let cores = 1 + (seed as usize % 3);
        let workload = random_workload(&params(cores), seed);
        let (events, report) = common::run(workload);

        // +1 at each start, -1 at each end; ends sort before starts at the same tick
        let mut edges: Vec<(Ticks, i64)> = Vec::new();
        for g in common::grants(&events) {
            if g.resource == Resource::Core {
                edges.push((g.start, 1));
                edges.push((g.end, -1));
            }
        }
        edges.sort();

        let mut busy = 0;
        for (time, delta) in edges {
            busy += delta;
            assert!(
                busy >= 0 && busy <= cores as i64,
                "seed {seed}: {busy} cores busy at t={time} with a pool of {cores}"
            );
        }
        assert!(report.average_busy_cores <= cores as f64);
        assert!(report.ssd_utilization <= 1.0);
    }
}

/// Grant, release and admission times never go backwards.
#[test]
fn test_clock_is_monotonic() {
    for seed in 0..30 {
        let workload = random_workload(&params(2), seed);
        let (events, _) = common::run(workload);

        let mut last = 0;
        for event in &events {
            let time = match *event {
                SimEvent::Admitted { time, .. }
                | SimEvent::Released { time, .. }
                | SimEvent::SsdWait { time, .. } => time,
                SimEvent::Granted { start, .. } => start,
                _ => continue,
            };
            assert!(time >= last, "seed {seed}: clock went from {last} back to {time}");
            last = time;
        }
    }
}

/// Busy-time statistics match the instruction durations that were run.
#[test]
fn test_statistics_match_workload() {
    for seed in 0..10 {
        let workload = random_workload(&params(2), seed);
        let (events, report) = common::run(workload.clone());

        let mut core_time = 0;
        let mut ssd_time = 0;
        let mut ssd_count = 0;
        for instr in workload.processes.iter().flat_map(|p| &p.instructions) {
            match instr.resource {
                Resource::Core => core_time += instr.duration,
                Resource::Ssd => {
                    ssd_time += instr.duration;
                    ssd_count += 1;
                }
                Resource::Tty => {}
            }
        }

        let end = common::grants(&events)
            .iter()
            .map(|g| g.end)
            .max()
            .unwrap_or(0);
        assert_eq!(report.simulated_time, end, "seed {seed}");
        assert_eq!(report.ssd_accesses, ssd_count, "seed {seed}");
        assert_eq!(
            report.average_busy_cores,
            core_time as f64 / end as f64,
            "seed {seed}"
        );
        assert_eq!(
            report.ssd_utilization,
            ssd_time as f64 / end as f64,
            "seed {seed}"
        );

        let arrivals: HashMap<Pid, Ticks> = workload
            .processes
            .iter()
            .map(|p| (p.pid, p.arrival_time))
            .collect();
        let turnaround: f64 = arrivals
            .iter()
            .map(|(&pid, &arrival)| (common::terminated_at(&events, pid).unwrap() - arrival) as f64)
            .sum::<f64>()
            / arrivals.len() as f64;
        assert!((report.mean_turnaround - turnaround).abs() < 1e-6, "seed {seed}");
    }
}
