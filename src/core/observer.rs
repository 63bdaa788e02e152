use super::state::{Container, Resource, SimState, Ticks};

/// Re-checks the global accounting invariants after every driver iteration.
#[derive(Debug)]
pub struct Observer {
    step: u64,
    last_now: Ticks,
}

impl Observer {
    pub fn new() -> Self {
        Self {
            step: 0,
            last_now: 0,
        }
    }

    pub fn observe(&mut self, state: &SimState) {
        self.step += 1;
        let step = self.step;

        assert!(
            state.now >= self.last_now,
            "step {step}: clock went backwards from {} to {}",
            self.last_now,
            state.now
        );
        self.last_now = state.now;

        // Conservation: each live record sits in exactly one container
        let held = state.pending_arrivals.len()
            + state.interactive_queue.len()
            + state.non_interactive_queue.len()
            + state.ssd_wait_queue.len()
            + state.active_holds.len();
        assert_eq!(
            held,
            state.procs.len(),
            "step {step}: {} records but {held} container slots",
            state.procs.len()
        );
        assert_eq!(
            state.location.len(),
            state.procs.len(),
            "step {step}: location map out of sync with records"
        );
        assert_eq!(
            state.in_flight() as usize,
            held - state.pending_arrivals.len(),
            "step {step}: admitted - terminated != processes in the system"
        );

        let queues = [
            (Container::InteractiveQueue, &state.interactive_queue),
            (Container::NonInteractiveQueue, &state.non_interactive_queue),
            (Container::SsdWaitQueue, &state.ssd_wait_queue),
        ];
        for (container, queue) in queues {
            for key in queue {
                assert_eq!(
                    state.location.get(key),
                    Some(&container),
                    "step {step}: queue {container:?} holds a process located elsewhere"
                );
                debug_assert!(
                    state.proc(*key).active_hold.is_none(),
                    "step {step}: queued process {} still holds a resource",
                    state.proc(*key).pid
                );
            }
        }
        for key in state.pending_arrivals.values() {
            assert_eq!(
                state.location.get(key),
                Some(&Container::PendingArrivals),
                "step {step}: pending arrival located elsewhere"
            );
        }

        let mut core_holds = 0;
        let mut ssd_holds = 0;
        for (key, order) in state.active_holds.iter() {
            assert_eq!(
                state.location.get(key),
                Some(&Container::ActiveHolds),
                "step {step}: active hold located elsewhere"
            );
            let proc = state.proc(*key);
            let hold = proc.active_hold.unwrap_or_else(|| {
                panic!("step {step}: process {} in active_holds without a hold", proc.pid)
            });
            debug_assert_eq!(hold.end, order.end, "step {step}: hold end out of sync");
            assert!(
                hold.end >= state.now,
                "step {step}: hold of process {} ended at {} but is still active at {}",
                proc.pid,
                hold.end,
                state.now
            );
            match hold.resource {
                Resource::Core => core_holds += 1,
                Resource::Ssd => ssd_holds += 1,
                Resource::Tty => {}
            }
        }

        assert_eq!(
            state.free_cores + core_holds,
            state.max_cores,
            "step {step}: free cores plus core holds must equal the pool size"
        );
        assert!(
            ssd_holds <= 1,
            "step {step}: {ssd_holds} processes hold the SSD at once"
        );
        assert_eq!(
            state.ssd_free,
            ssd_holds == 0,
            "step {step}: ssd_free disagrees with the active holds"
        );
        assert!(
            state.ssd_wait_queue.is_empty() || !state.ssd_free,
            "step {step}: processes wait for a free SSD"
        );
    }
}
