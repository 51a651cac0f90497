//! Kernel component: CPU scheduling, system calls and the buffer cache.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use disksim_core::{cast, log_debug, log_info, Event, EventHandler, Id, SimulationContext};

use crate::cache::BufferCache;
use crate::disk::DiskDrive;
use crate::events::{
    ComputeFinished, InterruptHandled, ProcessStarted, ProcessTerminated, QuantumExpired,
    RequestCompleted, RequestIssued, SyscallFinished,
};
use crate::process::{Process, ProcessState};
use crate::request::{IoRequest, OpKind};

/// Timing costs of kernel activities, charged against the running process's
/// quantum.
#[derive(Clone, Copy, Debug)]
pub struct CpuCosts {
    /// CPU time quantum of one burst, in ms.
    pub quantum: f64,
    /// Duration of the system call issuing a request, in ms.
    pub syscall_time: f64,
    /// Duration of the disk completion interrupt handler, in ms.
    pub interrupt_time: f64,
    /// Time a process spends consuming the data of one request, in ms.
    pub compute_time: f64,
}

/// Final state of one process, reported after the simulation.
pub struct ProcessSummary {
    /// Process identifier.
    pub pid: u32,
    /// Completed operations.
    pub completed: usize,
    /// Operations in the trace.
    pub total: usize,
    /// State the process ended in.
    pub state: ProcessState,
}

/// The kernel: owns the processes, the ready rotation and the buffer cache,
/// and drives the single simulated CPU.
///
/// Exactly one process runs at any instant. A running process issues its next
/// disk operation via a system call; on a cache hit it keeps running and
/// consumes the data, on a miss it blocks while the request travels through
/// the disk drive. Quantum expiry preempts the process to the tail of the
/// ready rotation. The completion interrupt unblocks the waiting process and
/// inserts the freshly read block into the cache.
pub struct Kernel {
    processes: Vec<Process>,
    ready: VecDeque<u32>,
    running: Option<u32>,
    dispatch_pending: bool,
    cache: BufferCache,
    drive: Rc<RefCell<DiskDrive>>,
    costs: CpuCosts,
    stats: Id,
    terminated: usize,
    ctx: SimulationContext,
}

impl Kernel {
    /// Creates a kernel over the given processes, cache and drive.
    pub fn new(
        processes: Vec<Process>,
        cache: BufferCache,
        drive: Rc<RefCell<DiskDrive>>,
        costs: CpuCosts,
        stats: Id,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            processes,
            ready: VecDeque::new(),
            running: None,
            dispatch_pending: false,
            cache,
            drive,
            costs,
            stats,
            terminated: 0,
            ctx,
        }
    }

    /// Puts every process into the ready rotation and dispatches the first one
    /// at the current simulation time.
    pub fn start(&mut self) {
        let pids: Vec<u32> = self.processes.iter().map(|p| p.pid()).collect();
        self.ready.extend(pids);
        self.schedule_next();
    }

    /// Returns whether every process has terminated.
    pub fn all_terminated(&self) -> bool {
        self.terminated == self.processes.len()
    }

    /// Read access to the buffer cache, for inspection and reporting.
    pub fn cache(&self) -> &BufferCache {
        &self.cache
    }

    /// Final per-process summaries.
    pub fn process_summaries(&self) -> Vec<ProcessSummary> {
        self.processes
            .iter()
            .map(|p| ProcessSummary {
                pid: p.pid(),
                completed: p.completed(),
                total: p.trace_len(),
                state: p.state(),
            })
            .collect()
    }

    fn process(&self, pid: u32) -> &Process {
        self.processes
            .iter()
            .find(|p| p.pid() == pid)
            .expect("event names an unknown process")
    }

    fn process_mut(&mut self, pid: u32) -> &mut Process {
        self.processes
            .iter_mut()
            .find(|p| p.pid() == pid)
            .expect("event names an unknown process")
    }

    fn schedule_next(&mut self) {
        if self.running.is_some() || self.dispatch_pending {
            return;
        }
        match self.ready.pop_front() {
            Some(pid) => {
                self.dispatch_pending = true;
                self.ctx.emit_self_now(ProcessStarted { pid });
            }
            None => {
                log_debug!(self.ctx, "no ready processes");
            }
        }
    }

    fn on_process_started(&mut self, pid: u32) {
        self.dispatch_pending = false;
        assert!(self.running.is_none(), "dispatch while another process is running");
        let quantum = self.costs.quantum;
        if self.process(pid).is_done() {
            self.finish_process(pid);
            self.schedule_next();
            return;
        }
        self.process_mut(pid).dispatch(quantum);
        self.running = Some(pid);
        self.issue_request(pid);
    }

    fn issue_request(&mut self, pid: u32) {
        let (op, sector) = self
            .process(pid)
            .current_request()
            .expect("request issue for an exhausted trace");
        log_info!(self.ctx, "process {} syscall {}(sector {})", pid, op, sector);
        let syscall_time = self.costs.syscall_time;
        self.process_mut(pid).charge(syscall_time);
        self.ctx.emit_now(RequestIssued { pid, sector, op }, self.stats);
        let hit = self.cache.lookup(sector, pid, op);
        self.ctx.emit_self(SyscallFinished { pid, sector, op, hit }, syscall_time);
    }

    fn on_syscall_finished(&mut self, pid: u32, sector: u64, op: OpKind, hit: bool) {
        if hit {
            // data served from the cache: the process keeps the CPU and
            // spends compute time consuming it
            self.process_mut(pid).advance();
            self.ctx.emit_self(ComputeFinished { pid }, self.costs.compute_time);
        } else {
            self.process_mut(pid).block();
            let request = IoRequest {
                pid,
                sector,
                op,
                issue_time: self.ctx.time(),
                requester: self.ctx.id(),
            };
            self.drive.borrow_mut().submit(request);
            self.running = None;
            self.schedule_next();
        }
    }

    fn on_compute_finished(&mut self, pid: u32) {
        let compute_time = self.costs.compute_time;
        self.process_mut(pid).charge(compute_time);
        if self.process(pid).is_done() {
            self.finish_process(pid);
            self.running = None;
            self.schedule_next();
        } else if self.process(pid).quantum_exhausted() {
            self.process_mut(pid).preempt();
            self.ctx.emit_now(QuantumExpired { pid }, self.stats);
            self.ready.push_back(pid);
            self.running = None;
            self.schedule_next();
        } else {
            self.issue_request(pid);
        }
    }

    fn on_request_completed(&mut self, pid: u32, sector: u64, op: OpKind) {
        log_info!(self.ctx, "interrupt: disk I/O complete for sector {}", sector);
        // the interrupt handler steals CPU time from whichever process runs now
        let interrupt_time = self.costs.interrupt_time;
        if let Some(running_pid) = self.running {
            self.process_mut(running_pid).charge(interrupt_time);
        }
        self.cache.insert(sector, op == OpKind::Write);
        self.ctx.emit_self(InterruptHandled { pid, sector, op }, interrupt_time);
    }

    fn on_interrupt_handled(&mut self, pid: u32) {
        let process = self.process_mut(pid);
        process.unblock();
        process.advance();
        self.ready.push_back(pid);
        self.schedule_next();
    }

    fn finish_process(&mut self, pid: u32) {
        self.process_mut(pid).terminate();
        self.ctx.emit_now(ProcessTerminated { pid }, self.stats);
        self.terminated += 1;
        if self.all_terminated() {
            log_info!(self.ctx, "all processes terminated");
        }
    }
}

impl EventHandler for Kernel {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            ProcessStarted { pid } => {
                self.on_process_started(pid);
            }
            SyscallFinished { pid, sector, op, hit } => {
                self.on_syscall_finished(pid, sector, op, hit);
            }
            ComputeFinished { pid } => {
                self.on_compute_finished(pid);
            }
            RequestCompleted { pid, sector, op, .. } => {
                self.on_request_completed(pid, sector, op);
            }
            InterruptHandled { pid, .. } => {
                self.on_interrupt_handled(pid);
            }
        })
    }
}
