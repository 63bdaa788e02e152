use tracing::{debug, info, trace};

use super::{
    event::{SimEvent, Snapshot, SnapshotEntry},
    observer::Observer,
    state::{
        Container, Instruction, Pid, ProcKey, ProcessClass, ProcessState, Resource, SimState,
        Ticks,
    },
};

/// What the completion handler did on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    // No hold is due before the next arrival
    NotDue,
    FreedCore,
    FreedDevice,
}

pub struct SimCore {
    pub state: SimState,
    observer: Observer,
    pub(super) events: Vec<SimEvent>,
    // Terminations the driver still has to surface, with their times
    notices: Vec<(Pid, Ticks)>,
    finished: bool,
}

impl SimCore {
    pub fn new(max_cores: usize) -> Self {
        Self {
            state: SimState::new(max_cores),
            observer: Observer::new(),
            events: Vec::new(),
            notices: Vec::new(),
            finished: false,
        }
    }

    pub fn submit(&mut self, pid: Pid, arrival_time: Ticks, instructions: Vec<Instruction>) {
        assert!(
            arrival_time >= self.state.now,
            "Process {pid} submitted for t={arrival_time}, which is already in the past"
        );
        self.finished = false;
        self.state.submit(pid, arrival_time, instructions);
    }

    /// One driver iteration: admit, grant cores, surface terminations, then
    /// release the next due hold. Returns the events in the order they happened.
    pub fn step(&mut self) -> Vec<SimEvent> {
        let mut progressed = false;

        while !self.state.pending_arrivals.is_empty() && self.admit_arrivals() {
            progressed = true;
        }

        progressed |= self.schedule_cores();

        self.surface_terminations();

        match self.complete_next_hold() {
            Completion::NotDue => {}
            Completion::FreedCore => progressed = true,
            Completion::FreedDevice => {
                if self.state.free_cores == self.state.max_cores {
                    trace!(now = self.state.now, "device released with every core idle");
                }
                progressed = true;
            }
        }

        if !progressed && !self.state.is_empty() {
            panic!(
                "Simulation stalled at t={} with {} in flight: no admission, grant or release possible",
                self.state.now,
                self.state.in_flight()
            );
        }

        self.observer.observe(&self.state);
        std::mem::take(&mut self.events)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_empty() && self.notices.is_empty()
    }

    pub fn has_reported(&self) -> bool {
        self.finished
    }

    /// Admit arrivals that are due. Holds ending at or before an arrival's
    /// time are drained first, and the clock only jumps ahead to a future
    /// arrival once no ready process can still take a free core now.
    fn admit_arrivals(&mut self) -> bool {
        let mut admitted = false;

        while let Some(arrival) = self.state.next_arrival_time() {
            if self.state.next_hold_end().is_some_and(|end| end <= arrival) {
                break;
            }
            if arrival > self.state.now && !self.instant_settled() {
                break;
            }

            let key = self
                .state
                .take_next_arrival()
                .expect("Peeked arrival missing from pending_arrivals");
            self.state.advance_to(arrival);
            self.admit(key);
            admitted = true;
        }

        admitted
    }

    fn instant_settled(&self) -> bool {
        self.state.ready_len() == 0 || self.state.free_cores == 0
    }

    fn admit(&mut self, key: ProcKey) {
        let now = self.state.now;
        // The first max_cores admissions are handed a core straight away
        let gets_core = self.state.admitted < self.state.max_cores as u64;
        self.state.admitted += 1;

        let proc = self.state.proc_mut(key);
        proc.class = ProcessClass::NonInteractive;
        proc.state = if gets_core {
            ProcessState::Running
        } else {
            ProcessState::Ready
        };
        let (pid, state, empty) = (proc.pid, proc.state, proc.pending.is_empty());

        info!(pid, time = now, "process started");
        self.events.push(SimEvent::Admitted {
            pid,
            time: now,
            state,
        });
        self.events.push(SimEvent::Snapshot(self.snapshot()));

        // Nothing to run: done the moment it arrives
        if empty {
            self.terminate(key);
            return;
        }

        self.state
            .queue_push_back(Container::NonInteractiveQueue, key);
    }

    /// Interactive processes are preferred whenever any are waiting.
    fn active_queue(&self) -> Container {
        if self.state.interactive_queue.is_empty() {
            Container::NonInteractiveQueue
        } else {
            Container::InteractiveQueue
        }
    }

    /// Serve one queue, chosen once per iteration, until it empties or the
    /// cores run out.
    fn schedule_cores(&mut self) -> bool {
        let queue = self.active_queue();
        let mut granted = false;

        while self.state.free_cores > 0 {
            let Some(key) = self.state.queue_pop_front(queue) else {
                break;
            };
            self.state.acquire_core();
            self.grant_and_record(key, Resource::Core);
            granted = true;
        }

        granted
    }

    fn surface_terminations(&mut self) {
        if self.notices.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (pid, time) in std::mem::take(&mut self.notices) {
            debug!(pid, time, "surfacing termination");
            self.events.push(SimEvent::Snapshot(snapshot.clone()));
            self.events.push(SimEvent::TerminationNotice { pid });
        }
    }

    /// Release the earliest hold if it is due before the next arrival, then
    /// route or terminate its process.
    pub fn complete_next_hold(&mut self) -> Completion {
        let Some(end) = self.state.next_hold_end() else {
            return Completion::NotDue;
        };
        if self.state.next_arrival_time().is_some_and(|arrival| arrival < end) {
            return Completion::NotDue;
        }

        let (key, order) = self
            .state
            .hold_pop()
            .expect("Peeked hold missing from active_holds");
        self.state.advance_to(order.end);

        let proc = self.state.proc_mut(key);
        let pid = proc.pid;
        let hold = proc
            .active_hold
            .take()
            .expect("Process in active_holds has no hold recorded");
        debug_assert_eq!(hold.end, order.end, "Hold end out of sync for {pid}");

        match hold.resource {
            Resource::Core => self.state.release_core(),
            Resource::Ssd => self.state.release_ssd(),
            Resource::Tty => {}
        }
        debug!(pid, resource = %hold.resource, time = hold.end, "released");
        self.events.push(SimEvent::Released {
            pid,
            resource: hold.resource,
            time: hold.end,
        });

        if self.state.proc(key).pending.is_empty() {
            self.terminate(key);
        } else {
            self.route(key, hold.resource);
        }

        match hold.resource {
            Resource::Core => Completion::FreedCore,
            Resource::Ssd | Resource::Tty => Completion::FreedDevice,
        }
    }

    /// Remove a detached process from the model and account for it.
    fn terminate(&mut self, key: ProcKey) {
        let now = self.state.now;
        let mut proc = self.state.destroy(key);
        proc.state = ProcessState::Terminated;
        self.state.terminated += 1;
        self.state
            .stats
            .record_completion(proc.arrival_time, now);
        info!(pid = proc.pid, time = now, state = %proc.state, "process terminated");
        self.events.push(SimEvent::Terminated {
            pid: proc.pid,
            time: now,
        });

        if self.state.in_flight() == 0 && self.state.pending_arrivals.is_empty() {
            self.surface_terminations();
            self.events
                .push(SimEvent::TerminationNotice { pid: proc.pid });
            let report = self.state.stats.report();
            info!(?report, "simulation finished");
            self.events.push(SimEvent::Finished(report));
            self.finished = true;
        } else {
            self.notices.push((proc.pid, now));
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let entry = |key: ProcKey, container: Container| {
            let proc = state.proc(key);
            SnapshotEntry {
                pid: proc.pid,
                state: proc.state,
                container,
            }
        };

        let mut entries = Vec::with_capacity(state.procs.len());
        entries.extend(
            state
                .interactive_queue
                .iter()
                .map(|&k| entry(k, Container::InteractiveQueue)),
        );
        entries.extend(
            state
                .holds_in_order()
                .into_iter()
                .map(|(k, _)| entry(k, Container::ActiveHolds)),
        );
        entries.extend(
            state
                .non_interactive_queue
                .iter()
                .map(|&k| entry(k, Container::NonInteractiveQueue)),
        );
        entries.extend(
            state
                .ssd_wait_queue
                .iter()
                .map(|&k| entry(k, Container::SsdWaitQueue)),
        );

        Snapshot {
            time: state.now,
            entries,
        }
    }
}
