use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use super::stats::Stats;

pub type Ticks = u64;
pub type Pid = u64;
new_key_type! {
    pub struct ProcKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Core,
    Ssd,
    Tty,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Core => "CORE",
            Self::Ssd => "SSD",
            Self::Tty => "TTY",
        };
        f.write_str(name)
    }
}

impl FromStr for Resource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CORE" => Ok(Self::Core),
            "SSD" => Ok(Self::Ssd),
            "TTY" => Ok(Self::Tty),
            other => anyhow::bail!("unknown resource marker {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessClass {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub resource: Resource,
    pub duration: Ticks,
}

/// The instruction currently occupying a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHold {
    pub resource: Resource,
    pub start: Ticks,
    pub end: Ticks,
}

#[derive(Debug)]
pub struct Process {
    pub pid: Pid,
    pub class: ProcessClass,
    pub arrival_time: Ticks,
    pub state: ProcessState,
    pub pending: VecDeque<Instruction>,
    pub active_hold: Option<ActiveHold>,
}

/// Every live process is in exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    PendingArrivals,
    InteractiveQueue,
    NonInteractiveQueue,
    SsdWaitQueue,
    ActiveHolds,
}

/// Position of a hold in `active_holds`: end time, then insertion order.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct HoldOrder {
    pub end: Ticks,
    pub seq: u64,
}

// KeyedPriorityQueue is a max-heap, so the earliest (end, seq) must compare greatest
impl PartialOrd for HoldOrder {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HoldOrder {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .end
            .cmp(&self.end)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct SimState {
    pub now: Ticks,
    pub max_cores: usize,
    pub free_cores: usize,
    pub ssd_free: bool,
    pub procs: SlotMap<ProcKey, Process>,
    pub location: FxHashMap<ProcKey, Container>,
    pub pending_arrivals: BTreeMap<(Ticks, u64), ProcKey>,
    pub interactive_queue: VecDeque<ProcKey>,
    pub non_interactive_queue: VecDeque<ProcKey>,
    pub ssd_wait_queue: VecDeque<ProcKey>,
    pub active_holds: KeyedPriorityQueue<ProcKey, HoldOrder>,
    pub stats: Stats,
    pub admitted: u64,
    pub terminated: u64,

    // Increment upon every insertion into active_holds / pending_arrivals
    next_hold_seq: u64,
    next_input_seq: u64,
}

impl SimState {
    pub fn new(max_cores: usize) -> Self {
        assert!(max_cores > 0, "Simulation requires at least one core");
        Self {
            now: 0,
            max_cores,
            free_cores: max_cores,
            ssd_free: true,
            procs: SlotMap::with_key(),
            location: FxHashMap::default(),
            pending_arrivals: BTreeMap::new(),
            interactive_queue: VecDeque::new(),
            non_interactive_queue: VecDeque::new(),
            ssd_wait_queue: VecDeque::new(),
            active_holds: KeyedPriorityQueue::new(),
            stats: Stats::default(),
            admitted: 0,
            terminated: 0,
            next_hold_seq: 0,
            next_input_seq: 0,
        }
    }

    /// Register a not-yet-arrived process. Input order breaks arrival-time ties.
    pub fn submit(&mut self, pid: Pid, arrival_time: Ticks, instructions: Vec<Instruction>) {
        let key = self.procs.insert(Process {
            pid,
            class: ProcessClass::NonInteractive,
            arrival_time,
            state: ProcessState::Ready,
            pending: instructions.into(),
            active_hold: None,
        });
        let seq = self.next_input_seq;
        self.next_input_seq += 1;
        self.pending_arrivals.insert((arrival_time, seq), key);
        self.attach(key, Container::PendingArrivals);
    }

    pub fn proc(&self, key: ProcKey) -> &Process {
        self.procs.get(key).expect("Unknown process key")
    }

    pub fn proc_mut(&mut self, key: ProcKey) -> &mut Process {
        self.procs.get_mut(key).expect("Unknown process key")
    }

    pub fn in_flight(&self) -> u64 {
        self.admitted - self.terminated
    }

    pub fn next_arrival_time(&self) -> Option<Ticks> {
        self.pending_arrivals.keys().next().map(|&(t, _)| t)
    }

    pub fn next_hold_end(&self) -> Option<Ticks> {
        self.active_holds.peek().map(|(_, order)| order.end)
    }

    pub fn is_empty(&self) -> bool {
        self.pending_arrivals.is_empty()
            && self.interactive_queue.is_empty()
            && self.non_interactive_queue.is_empty()
            && self.ssd_wait_queue.is_empty()
            && self.active_holds.is_empty()
    }

    pub fn ready_len(&self) -> usize {
        self.interactive_queue.len() + self.non_interactive_queue.len()
    }

    pub fn advance_to(&mut self, t: Ticks) {
        assert!(
            t >= self.now,
            "Logical clock must be non-decreasing: {} -> {t}",
            self.now
        );
        self.now = t;
        self.stats.simulated_time = t;
    }

    fn detach(&mut self, key: ProcKey, from: Container) {
        let removed = self.location.remove(&key);
        assert_eq!(
            removed,
            Some(from),
            "Process {} was expected in {from:?}",
            self.proc(key).pid
        );
    }

    fn attach(&mut self, key: ProcKey, to: Container) {
        let prev = self.location.insert(key, to);
        assert!(
            prev.is_none(),
            "Process {} already present in {prev:?}",
            self.proc(key).pid
        );
    }

    fn queue_mut(&mut self, queue: Container) -> &mut VecDeque<ProcKey> {
        match queue {
            Container::InteractiveQueue => &mut self.interactive_queue,
            Container::NonInteractiveQueue => &mut self.non_interactive_queue,
            Container::SsdWaitQueue => &mut self.ssd_wait_queue,
            other => panic!("{other:?} is not a FIFO queue"),
        }
    }

    /// Remove the earliest pending arrival; the caller must place it elsewhere.
    pub fn take_next_arrival(&mut self) -> Option<ProcKey> {
        let (_, key) = self.pending_arrivals.pop_first()?;
        self.detach(key, Container::PendingArrivals);
        Some(key)
    }

    pub fn queue_push_back(&mut self, queue: Container, key: ProcKey) {
        self.attach(key, queue);
        self.queue_mut(queue).push_back(key);
    }

    pub fn queue_pop_front(&mut self, queue: Container) -> Option<ProcKey> {
        let key = self.queue_mut(queue).pop_front()?;
        self.detach(key, queue);
        Some(key)
    }

    pub fn hold_push(&mut self, key: ProcKey, end: Ticks) {
        self.attach(key, Container::ActiveHolds);
        let seq = self.next_hold_seq;
        self.next_hold_seq += 1;
        self.active_holds.push(key, HoldOrder { end, seq });
    }

    pub fn hold_pop(&mut self) -> Option<(ProcKey, HoldOrder)> {
        let (key, order) = self.active_holds.pop()?;
        self.detach(key, Container::ActiveHolds);
        Some((key, order))
    }

    /// Drop a detached process from the model for good.
    pub fn destroy(&mut self, key: ProcKey) -> Process {
        debug_assert!(
            !self.location.contains_key(&key),
            "Destroying process that is still in a container"
        );
        self.procs.remove(key).expect("Unknown process key")
    }

    pub fn acquire_core(&mut self) {
        assert!(
            self.free_cores > 0,
            "Core granted while all {} cores are held",
            self.max_cores
        );
        self.free_cores -= 1;
    }

    pub fn release_core(&mut self) {
        assert!(
            self.free_cores < self.max_cores,
            "Core released while none are held"
        );
        self.free_cores += 1;
    }

    pub fn acquire_ssd(&mut self) {
        assert!(self.ssd_free, "SSD granted while already held");
        self.ssd_free = false;
        self.stats.ssd_accesses += 1;
    }

    pub fn release_ssd(&mut self) {
        assert!(!self.ssd_free, "SSD released while not held");
        self.ssd_free = true;
    }

    /// Active holds in the order they will complete.
    pub fn holds_in_order(&self) -> Vec<(ProcKey, HoldOrder)> {
        let mut holds: Vec<_> = self.active_holds.iter().map(|(k, o)| (*k, *o)).collect();
        // Ord is inverted, so descending order is earliest first
        holds.sort_by(|a, b| b.1.cmp(&a.1));
        holds
    }
}
