//! Simulated user processes.

use disksim_core::{log_debug, log_info, SimulationContext};

use crate::request::OpKind;

/// Lifecycle state of a simulated process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Waiting in the ready rotation for the CPU.
    Ready,
    /// Executing on the single simulated CPU.
    Running,
    /// Waiting for a disk request to complete.
    Blocked,
    /// Request trace exhausted.
    Terminated,
}

/// One simulated user task: a finite state machine driven by kernel events.
///
/// A process owns an ordered trace of disk operations. While running it
/// consumes CPU time charged against its quantum; it blocks when a request
/// must go to the disk, is preempted when the quantum runs out, and terminates
/// once the trace is exhausted.
pub struct Process {
    pid: u32,
    state: ProcessState,
    quantum_remaining: f64,
    trace: Vec<(OpKind, u64)>,
    position: usize,
    ctx: SimulationContext,
}

impl Process {
    /// Creates a process in the ready state with the given request trace.
    pub fn new(pid: u32, trace: Vec<(OpKind, u64)>, ctx: SimulationContext) -> Self {
        Self {
            pid,
            state: ProcessState::Ready,
            quantum_remaining: 0.0,
            trace,
            position: 0,
            ctx,
        }
    }

    /// Process identifier.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// The next operation of the trace, if any remains.
    pub fn current_request(&self) -> Option<(OpKind, u64)> {
        self.trace.get(self.position).copied()
    }

    /// Number of completed operations.
    pub fn completed(&self) -> usize {
        self.position
    }

    /// Total number of operations in the trace.
    pub fn trace_len(&self) -> usize {
        self.trace.len()
    }

    /// Returns whether the trace is exhausted.
    pub fn is_done(&self) -> bool {
        self.position >= self.trace.len()
    }

    /// Moves past the current operation once it is satisfied.
    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Remaining quantum of the current CPU burst.
    pub fn quantum_remaining(&self) -> f64 {
        self.quantum_remaining
    }

    /// Charges CPU time against the quantum.
    pub fn charge(&mut self, time: f64) {
        self.quantum_remaining -= time;
    }

    /// Returns whether the quantum of the current burst is used up.
    pub fn quantum_exhausted(&self) -> bool {
        self.quantum_remaining <= 0.0
    }

    /// Ready -> Running with a fresh quantum.
    pub fn dispatch(&mut self, quantum: f64) {
        assert_eq!(self.state, ProcessState::Ready, "dispatch of a process that is not ready");
        self.state = ProcessState::Running;
        self.quantum_remaining = quantum;
        log_info!(self.ctx, "started (quantum {:.2} ms)", quantum);
    }

    /// Running -> Blocked, awaiting a disk request.
    pub fn block(&mut self) {
        assert_eq!(self.state, ProcessState::Running, "block of a process that is not running");
        self.state = ProcessState::Blocked;
        log_debug!(self.ctx, "blocked on disk I/O");
    }

    /// Blocked -> Ready after the awaited request completed.
    pub fn unblock(&mut self) {
        assert_eq!(self.state, ProcessState::Blocked, "unblock of a process that is not blocked");
        self.state = ProcessState::Ready;
        log_debug!(self.ctx, "unblocked");
    }

    /// Running -> Ready on quantum expiry.
    pub fn preempt(&mut self) {
        assert_eq!(self.state, ProcessState::Running, "preempt of a process that is not running");
        self.state = ProcessState::Ready;
        log_info!(self.ctx, "quantum expired, preempted");
    }

    /// Final transition once the trace is exhausted.
    pub fn terminate(&mut self) {
        assert!(self.is_done(), "termination with operations remaining");
        assert_ne!(self.state, ProcessState::Terminated, "double termination");
        self.state = ProcessState::Terminated;
        log_info!(self.ctx, "finished");
    }
}
