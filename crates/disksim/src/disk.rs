//! Disk drive component: the head state machine and request execution.

use disksim_core::{cast, log_debug, log_info, Event, EventHandler, Id, SimulationContext};

use crate::events::{RequestCompleted, RotationCompleted, SeekCompleted, TransferCompleted};
use crate::geometry::DiskGeometry;
use crate::request::IoRequest;
use crate::scheduler::SchedulerStrategy;

/// The disk drive: holds the head position and executes one request at a time.
///
/// Requests submitted to the drive enter the scheduling strategy queue; the
/// head pulls the next request from the strategy only when idle. Each request
/// runs through seek, rotation and sector transfer phases whose durations come
/// from the [`DiskGeometry`] model, emitting [`SeekCompleted`],
/// [`RotationCompleted`] and finally [`RequestCompleted`] along the way.
pub struct DiskDrive {
    geometry: DiskGeometry,
    strategy: Box<dyn SchedulerStrategy>,
    head_track: u64,
    in_flight: Option<IoRequest>,
    stats: Id,
    ctx: SimulationContext,
}

impl DiskDrive {
    /// Creates an idle drive with the head parked at track 0.
    pub fn new(
        geometry: DiskGeometry,
        strategy: Box<dyn SchedulerStrategy>,
        stats: Id,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            geometry,
            strategy,
            head_track: 0,
            in_flight: None,
            stats,
            ctx,
        }
    }

    /// Queues a request under the scheduling strategy and starts servicing it
    /// immediately if the head is idle.
    pub fn submit(&mut self, request: IoRequest) {
        log_info!(
            self.ctx,
            "queued {} sector {} from process {} ({})",
            request.op,
            request.sector,
            request.pid,
            self.strategy.name()
        );
        self.strategy.enqueue(request);
        if self.in_flight.is_none() {
            self.dispatch_next();
        }
    }

    /// Current head track.
    pub fn head_track(&self) -> u64 {
        self.head_track
    }

    /// Returns whether the drive is servicing a request.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns whether any request waits in the strategy queue.
    pub fn has_pending(&self) -> bool {
        self.strategy.has_pending()
    }

    fn dispatch_next(&mut self) {
        let request = match self.strategy.next(self.head_track) {
            Some(request) => request,
            None => return,
        };
        let target_track = request.track(self.geometry.sectors_per_track());
        let distance = self.head_track.abs_diff(target_track);
        let seek_time = self.geometry.seek_time(self.head_track, target_track);
        log_debug!(
            self.ctx,
            "selected {} sector {} from process {}",
            request.op,
            request.sector,
            request.pid
        );
        if distance > 0 {
            log_info!(
                self.ctx,
                "seeking to track {} ({} tracks, {:.2} ms)",
                target_track,
                distance,
                seek_time
            );
        } else {
            log_info!(self.ctx, "already at track {}", target_track);
        }
        self.in_flight = Some(request);
        self.ctx.emit_self(
            SeekCompleted {
                track: target_track,
                distance,
                seek_time,
            },
            seek_time,
        );
    }

    fn on_seek_completed(&mut self, track: u64, distance: u64, seek_time: f64) {
        self.head_track = track;
        self.ctx.emit_now(
            SeekCompleted {
                track,
                distance,
                seek_time,
            },
            self.stats,
        );
        log_info!(
            self.ctx,
            "rotational latency {:.2} ms",
            self.geometry.rotational_latency()
        );
        self.ctx
            .emit_self(RotationCompleted {}, self.geometry.rotational_latency());
    }

    fn on_rotation_completed(&mut self) {
        let request = self.in_flight.as_ref().expect("rotation completed on an idle drive");
        log_info!(
            self.ctx,
            "transferring sector {} ({:.2} ms)",
            request.sector,
            self.geometry.sector_transfer_time()
        );
        self.ctx
            .emit_self(TransferCompleted {}, self.geometry.sector_transfer_time());
    }

    fn on_transfer_completed(&mut self) {
        let request = self.in_flight.take().expect("transfer completed on an idle drive");
        log_info!(self.ctx, "sector {} {} complete", request.sector, request.op);
        let completed = RequestCompleted {
            pid: request.pid,
            sector: request.sector,
            op: request.op,
            wait_time: self.ctx.time() - request.issue_time,
        };
        self.ctx.emit_now(completed.clone(), request.requester);
        self.ctx.emit_now(completed, self.stats);
        self.dispatch_next();
    }
}

impl EventHandler for DiskDrive {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            SeekCompleted { track, distance, seek_time } => {
                self.on_seek_completed(track, distance, seek_time);
            }
            RotationCompleted {} => {
                self.on_rotation_completed();
            }
            TransferCompleted {} => {
                self.on_transfer_completed();
            }
        })
    }
}
