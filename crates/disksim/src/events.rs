//! Events exchanged by the disk I/O subsystem components.
//!
//! Events destined for the [`Statistics`](crate::stats::Statistics) component
//! are pure observations: they carry a copy of what happened and never feed
//! back into simulation state.

use serde::Serialize;

use crate::request::OpKind;

// Kernel events

/// A process is dispatched onto the simulated CPU. Source: kernel, destination: kernel.
#[derive(Clone, Serialize)]
pub struct ProcessStarted {
    /// Identifier of the dispatched process.
    pub pid: u32,
}

/// The system call issuing an I/O request finished executing.
/// Source: kernel, destination: kernel.
#[derive(Clone, Serialize)]
pub struct SyscallFinished {
    /// Issuing process.
    pub pid: u32,
    /// Target sector.
    pub sector: u64,
    /// Operation kind.
    pub op: OpKind,
    /// Whether the buffer cache lookup was a hit.
    pub hit: bool,
}

/// The running process finished consuming data of a completed request.
/// Source: kernel, destination: kernel.
#[derive(Clone, Serialize)]
pub struct ComputeFinished {
    /// Computing process.
    pub pid: u32,
}

/// The disk completion interrupt has been serviced and the blocked process
/// may be unblocked. Source: kernel, destination: kernel.
#[derive(Clone, Serialize)]
pub struct InterruptHandled {
    /// Process waiting on the completed request.
    pub pid: u32,
    /// Sector of the completed request.
    pub sector: u64,
    /// Operation kind of the completed request.
    pub op: OpKind,
}

// Disk drive events

/// The head reached the target track. Source: disk, destination: disk (self),
/// with a copy forwarded to statistics.
#[derive(Clone, Serialize)]
pub struct SeekCompleted {
    /// Track the head arrived at.
    pub track: u64,
    /// Distance covered, in tracks.
    pub distance: u64,
    /// Seek time spent, in ms.
    pub seek_time: f64,
}

/// The target sector rotated under the head. Source: disk, destination: disk (self).
#[derive(Clone, Serialize)]
pub struct RotationCompleted {}

/// The sector passed under the head and its data was transferred.
/// Source: disk, destination: disk (self).
#[derive(Clone, Serialize)]
pub struct TransferCompleted {}

/// A disk request finished. Source: disk, destination: requester (kernel),
/// with a copy forwarded to statistics.
#[derive(Clone, Serialize)]
pub struct RequestCompleted {
    /// Issuing process.
    pub pid: u32,
    /// Serviced sector.
    pub sector: u64,
    /// Operation kind.
    pub op: OpKind,
    /// Time from request issue to completion, in ms.
    pub wait_time: f64,
}

// Observation events consumed by statistics only

/// A process issued a read/write request. Source: kernel, destination: statistics.
#[derive(Clone, Serialize)]
pub struct RequestIssued {
    /// Issuing process.
    pub pid: u32,
    /// Target sector.
    pub sector: u64,
    /// Operation kind.
    pub op: OpKind,
}

/// A buffer cache lookup hit. Source: buffer cache, destination: statistics.
#[derive(Clone, Serialize)]
pub struct CacheHit {
    /// Process performing the lookup.
    pub pid: u32,
    /// Looked-up sector.
    pub sector: u64,
}

/// A buffer cache lookup missed. Source: buffer cache, destination: statistics.
#[derive(Clone, Serialize)]
pub struct CacheMiss {
    /// Process performing the lookup.
    pub pid: u32,
    /// Looked-up sector.
    pub sector: u64,
}

/// A running process exhausted its time quantum and was preempted.
/// Source: kernel, destination: statistics.
#[derive(Clone, Serialize)]
pub struct QuantumExpired {
    /// Preempted process.
    pub pid: u32,
}

/// A process exhausted its request trace and terminated.
/// Source: kernel, destination: statistics.
#[derive(Clone, Serialize)]
pub struct ProcessTerminated {
    /// Terminated process.
    pub pid: u32,
}
