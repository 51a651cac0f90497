//! Disk I/O requests.

use std::fmt;

use serde::Serialize;

use disksim_core::Id;

/// Kind of a disk operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OpKind {
    /// Read a sector from the disk.
    Read,
    /// Write a sector to the disk.
    Write,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpKind::Read => write!(f, "read"),
            OpKind::Write => write!(f, "write"),
        }
    }
}

/// A pending disk request.
///
/// Created by the kernel when a buffer cache miss must be resolved by the
/// disk. Immutable once created; at any moment the request is held by exactly
/// one owner: the scheduling strategy queue or the disk head executing it.
#[derive(Clone, Debug)]
pub struct IoRequest {
    /// Identifier of the issuing process.
    pub pid: u32,
    /// Target sector address.
    pub sector: u64,
    /// Operation kind.
    pub op: OpKind,
    /// Simulation time at which the request was issued.
    pub issue_time: f64,
    /// Component to notify on completion.
    pub requester: Id,
}

impl IoRequest {
    /// Track holding the target sector.
    pub fn track(&self, sectors_per_track: u64) -> u64 {
        self.sector / sectors_per_track
    }
}
