//! Statistics collector.

use disksim_core::{cast, Event, EventHandler};

use crate::events::{
    CacheHit, CacheMiss, ProcessTerminated, QuantumExpired, RequestCompleted, RequestIssued,
    SeekCompleted,
};

/// Accumulates counters from the observation events emitted by the other
/// components. Purely passive: it never mutates simulation state and never
/// emits events of its own.
#[derive(Default)]
pub struct Statistics {
    requests_issued: u64,
    cache_hits: u64,
    cache_misses: u64,
    seeks: u64,
    total_seek_distance: u64,
    total_seek_time: f64,
    requests_completed: u64,
    total_wait_time: f64,
    max_wait_time: f64,
    quantum_expirations: u64,
    terminated_processes: u64,
}

impl Statistics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total read/write requests issued by processes.
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Buffer cache hits.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Buffer cache misses.
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses
    }

    /// Cache hit percentage over all lookups, or zero if none happened.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64 * 100.0
    }

    /// Number of head seeks performed by the disk.
    pub fn seeks(&self) -> u64 {
        self.seeks
    }

    /// Total head travel distance, in tracks.
    pub fn total_seek_distance(&self) -> u64 {
        self.total_seek_distance
    }

    /// Total time spent seeking, in ms.
    pub fn total_seek_time(&self) -> f64 {
        self.total_seek_time
    }

    /// Average seek time, or zero without seeks.
    pub fn avg_seek_time(&self) -> f64 {
        if self.seeks == 0 {
            return 0.0;
        }
        self.total_seek_time / self.seeks as f64
    }

    /// Disk requests completed.
    pub fn requests_completed(&self) -> u64 {
        self.requests_completed
    }

    /// Average time from request issue to completion, or zero without completions.
    pub fn avg_wait_time(&self) -> f64 {
        if self.requests_completed == 0 {
            return 0.0;
        }
        self.total_wait_time / self.requests_completed as f64
    }

    /// Longest time any request spent from issue to completion.
    pub fn max_wait_time(&self) -> f64 {
        self.max_wait_time
    }

    /// Number of quantum expirations.
    pub fn quantum_expirations(&self) -> u64 {
        self.quantum_expirations
    }

    /// Number of terminated processes.
    pub fn terminated_processes(&self) -> u64 {
        self.terminated_processes
    }
}

impl EventHandler for Statistics {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            RequestIssued { .. } => {
                self.requests_issued += 1;
            }
            CacheHit { .. } => {
                self.cache_hits += 1;
            }
            CacheMiss { .. } => {
                self.cache_misses += 1;
            }
            SeekCompleted { distance, seek_time, .. } => {
                self.seeks += 1;
                self.total_seek_distance += distance;
                self.total_seek_time += seek_time;
            }
            RequestCompleted { wait_time, .. } => {
                self.requests_completed += 1;
                self.total_wait_time += wait_time;
                if wait_time > self.max_wait_time {
                    self.max_wait_time = wait_time;
                }
            }
            QuantumExpired { .. } => {
                self.quantum_expirations += 1;
            }
            ProcessTerminated { .. } => {
                self.terminated_processes += 1;
            }
        })
    }
}
