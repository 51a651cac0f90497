//! Disk geometry and timing model.

/// Physical parameters of a single-platter rotating disk and the timing
/// formulas derived from them.
///
/// The model is deliberately simple: seek time is linear in track distance and
/// rotational latency is a fixed half-rotation average, independent of the
/// exact sector offset. The half-rotation simplification is part of the model
/// contract and must not be replaced with an offset-exact calculation, so that
/// timings stay comparable across scheduler runs.
#[derive(Clone, Copy, Debug)]
pub struct DiskGeometry {
    tracks: u64,
    sectors_per_track: u64,
    seek_time_per_track: f64,
    rotation_period: f64,
}

impl DiskGeometry {
    /// Creates a geometry model.
    ///
    /// Inputs are pre-validated by the configuration layer:
    /// `tracks > 0`, `sectors_per_track > 0`, `rpm > 0`.
    pub fn new(tracks: u64, sectors_per_track: u64, seek_time_per_track: f64, rpm: u32) -> Self {
        Self {
            tracks,
            sectors_per_track,
            seek_time_per_track,
            rotation_period: 60_000.0 / rpm as f64,
        }
    }

    /// Total number of sectors on the disk.
    pub fn capacity(&self) -> u64 {
        self.tracks * self.sectors_per_track
    }

    /// Number of tracks on the disk.
    pub fn tracks(&self) -> u64 {
        self.tracks
    }

    /// Number of sectors on one track.
    pub fn sectors_per_track(&self) -> u64 {
        self.sectors_per_track
    }

    /// Track holding the given sector address.
    ///
    /// Panics if the sector lies outside the disk.
    pub fn track_of(&self, sector: u64) -> u64 {
        assert!(
            sector < self.capacity(),
            "sector {} is out of disk bounds (capacity {})",
            sector,
            self.capacity()
        );
        sector / self.sectors_per_track
    }

    /// Sector offset within its track.
    pub fn offset_of(&self, sector: u64) -> u64 {
        sector % self.sectors_per_track
    }

    /// Head movement time between two tracks, linear in track distance.
    /// Zero distance means zero time.
    pub fn seek_time(&self, from_track: u64, to_track: u64) -> f64 {
        from_track.abs_diff(to_track) as f64 * self.seek_time_per_track
    }

    /// Time of one full platter rotation.
    pub fn rotation_period(&self) -> f64 {
        self.rotation_period
    }

    /// Average wait for the target sector to reach the head,
    /// modeled as exactly half the rotation period.
    pub fn rotational_latency(&self) -> f64 {
        self.rotation_period / 2.0
    }

    /// Time for one sector to pass under the head.
    pub fn sector_transfer_time(&self) -> f64 {
        self.rotation_period / self.sectors_per_track as f64
    }
}
