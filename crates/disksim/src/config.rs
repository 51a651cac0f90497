//! Simulation configuration and its validation.

/// All tunable parameters of one simulation run.
///
/// Values are filled from the command line by the front end and validated with
/// [`SimConfig::validate`] before any component is built; the components
/// themselves assume valid inputs.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// I/O scheduling strategy name: `fifo`, `look` or `nlook`.
    pub scheduler: String,
    /// Number of user processes.
    pub processes: u32,
    /// CPU time quantum, in ms.
    pub quantum: f64,
    /// Buffer cache capacity, in blocks.
    pub buffers: usize,
    /// Upper bound of the hot cache segment, in blocks.
    pub hot_buffers: usize,
    /// Number of disk tracks.
    pub tracks: u64,
    /// Number of sectors per track.
    pub sectors_per_track: u64,
    /// Platter rotation speed, in revolutions per minute.
    pub rpm: u32,
    /// Head movement time per track, in ms.
    pub seek_time_per_track: f64,
    /// Duration of the request-issuing system call, in ms.
    pub syscall_time: f64,
    /// Duration of the completion interrupt handler, in ms.
    pub interrupt_time: f64,
    /// Time a process computes over the data of one request, in ms.
    pub compute_time: f64,
    /// Scenario name.
    pub scenario: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scheduler: "fifo".to_string(),
            processes: 2,
            quantum: 20.0,
            buffers: 10,
            hot_buffers: 5,
            tracks: 10_000,
            sectors_per_track: 500,
            rpm: 7500,
            seek_time_per_track: 0.5,
            syscall_time: 0.15,
            interrupt_time: 0.05,
            compute_time: 7.0,
            scenario: "default".to_string(),
        }
    }
}

impl SimConfig {
    /// Checks every numeric parameter, returning a descriptive message for the
    /// first invalid one. Scheduler and scenario names are validated by their
    /// factories.
    pub fn validate(&self) -> Result<(), String> {
        if self.processes == 0 {
            return Err("number of processes must be positive".to_string());
        }
        if self.quantum <= 0.0 {
            return Err("time quantum must be positive".to_string());
        }
        if self.buffers == 0 {
            return Err("number of buffers must be positive".to_string());
        }
        if self.hot_buffers >= self.buffers {
            return Err(
                "hot segment bound must be smaller than the total number of buffers".to_string(),
            );
        }
        if self.tracks == 0 {
            return Err("number of tracks must be positive".to_string());
        }
        if self.sectors_per_track == 0 {
            return Err("number of sectors per track must be positive".to_string());
        }
        if self.rpm == 0 {
            return Err("disk rotation speed must be positive".to_string());
        }
        if self.seek_time_per_track < 0.0 {
            return Err("seek time per track cannot be negative".to_string());
        }
        if self.syscall_time < 0.0 {
            return Err("syscall time cannot be negative".to_string());
        }
        if self.interrupt_time < 0.0 {
            return Err("interrupt time cannot be negative".to_string());
        }
        if self.compute_time < 0.0 {
            return Err("compute time cannot be negative".to_string());
        }
        Ok(())
    }
}
