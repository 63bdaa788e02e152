use tracing::debug;

use super::{
    driver::SimCore,
    event::SimEvent,
    state::{ActiveHold, Container, ProcKey, ProcessClass, ProcessState, Resource},
};

impl SimCore {
    /// Consume the process's next instruction as a hold on `grant`, starting now.
    /// The caller has already taken the core or the SSD.
    pub(crate) fn grant_and_record(&mut self, key: ProcKey, grant: Resource) {
        let now = self.state.now;
        let proc = self.state.proc_mut(key);
        let pid = proc.pid;
        let instr = proc
            .pending
            .pop_front()
            .unwrap_or_else(|| panic!("Process {pid} granted {grant} with no instruction left"));
        assert_eq!(
            instr.resource, grant,
            "Process {pid} granted {grant} but its next instruction needs {}",
            instr.resource
        );

        let end = now.checked_add(instr.duration).unwrap_or_else(|| {
            panic!(
                "Process {pid} {grant} hold of {} overflows the logical clock at t={now}",
                instr.duration
            )
        });
        proc.state = match grant {
            Resource::Core => ProcessState::Running,
            Resource::Ssd | Resource::Tty => ProcessState::Blocked,
        };
        proc.active_hold = Some(ActiveHold {
            resource: grant,
            start: now,
            end,
        });

        match grant {
            Resource::Core => self.state.stats.busy_core_time += instr.duration,
            Resource::Ssd => self.state.stats.ssd_busy_time += instr.duration,
            Resource::Tty => {}
        }

        self.state.hold_push(key, end);
        debug!(pid, resource = %grant, start = now, end, "granted");
        self.events.push(SimEvent::Granted {
            pid,
            resource: grant,
            start: now,
            end,
        });
    }

    /// After a CORE burst: take the SSD if it is free (else wait for it), or the TTY.
    pub(crate) fn request_next_resource(&mut self, key: ProcKey) {
        let proc = self.state.proc(key);
        let pid = proc.pid;
        let next = proc
            .pending
            .front()
            .unwrap_or_else(|| panic!("Process {pid} requested a resource with no instruction left"))
            .resource;

        match next {
            Resource::Ssd if self.state.ssd_free => {
                self.state.acquire_ssd();
                self.grant_and_record(key, Resource::Ssd);
            }
            Resource::Ssd => {
                self.state.proc_mut(key).state = ProcessState::Blocked;
                self.state.queue_push_back(Container::SsdWaitQueue, key);
                debug!(pid, time = self.state.now, "waiting for SSD");
                self.events.push(SimEvent::SsdWait {
                    pid,
                    time: self.state.now,
                });
            }
            Resource::Tty => self.grant_and_record(key, Resource::Tty),
            Resource::Core => {
                panic!("Process {pid} has a CORE instruction directly after a CORE burst")
            }
        }
    }

    /// Decide where a process goes after releasing `released`.
    pub(crate) fn route(&mut self, key: ProcKey, released: Resource) {
        match released {
            Resource::Core => self.request_next_resource(key),
            Resource::Ssd => {
                self.make_ready(key, ProcessClass::NonInteractive);
                if let Some(waiter) = self.state.queue_pop_front(Container::SsdWaitQueue) {
                    self.state.acquire_ssd();
                    self.grant_and_record(waiter, Resource::Ssd);
                }
            }
            Resource::Tty => self.make_ready(key, ProcessClass::Interactive),
        }
    }

    fn make_ready(&mut self, key: ProcKey, class: ProcessClass) {
        let proc = self.state.proc_mut(key);
        proc.state = ProcessState::Ready;
        proc.class = class;
        let queue = match class {
            ProcessClass::Interactive => Container::InteractiveQueue,
            ProcessClass::NonInteractive => Container::NonInteractiveQueue,
        };
        self.state.queue_push_back(queue, key);
    }
}
