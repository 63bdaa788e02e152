use std::ops::RangeInclusive;

use rand::prelude::*;

use super::job::{ProcessDef, Workload};
use crate::core::state::{Pid, Ticks};

/// Shape of a generated workload.
#[derive(Debug, Clone)]
pub struct RandomParams {
    pub processes: usize,
    pub max_cores: usize,
    pub interarrival: RangeInclusive<Ticks>,
    pub core_burst: RangeInclusive<Ticks>,
    pub ssd_burst: RangeInclusive<Ticks>,
    pub tty_burst: RangeInclusive<Ticks>,
    // Number of SSD/TTY steps, each followed by another CORE burst
    pub device_steps: RangeInclusive<usize>,
    pub p_tty: f64,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            processes: 20,
            max_cores: 2,
            interarrival: 0..=50,
            core_burst: 1..=100,
            ssd_burst: 1..=20,
            tty_burst: 50..=500,
            device_steps: 0..=4,
            p_tty: 0.3,
        }
    }
}

/// Reproducible workload: the same params and seed always give the same processes.
pub fn random_workload(params: &RandomParams, seed: u64) -> Workload {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut workload = Workload::new(params.max_cores);
    let mut arrival = 0;

    for pid in 0..params.processes {
        arrival += rng.random_range(params.interarrival.clone());

        let mut def =
            ProcessDef::new(pid as Pid, arrival).core(rng.random_range(params.core_burst.clone()));
        for _ in 0..rng.random_range(params.device_steps.clone()) {
            def = if rng.random::<f64>() < params.p_tty {
                def.tty(rng.random_range(params.tty_burst.clone()))
            } else {
                def.ssd(rng.random_range(params.ssd_burst.clone()))
            };
            def = def.core(rng.random_range(params.core_burst.clone()));
        }

        workload.processes.push(def);
    }

    workload
}
