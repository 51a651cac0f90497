//! Disk I/O scheduling strategies.
//!
//! A strategy owns the queue of pending requests and decides which request the
//! disk head services next. The strategy is selected once at configuration
//! time and never switched at runtime.

use std::collections::VecDeque;

use crate::request::IoRequest;

/// Ordering policy for pending disk requests.
///
/// `next()` on an empty queue returns `None`; none of the operations can fail
/// for a well-formed request.
pub trait SchedulerStrategy {
    /// Adds a request to the pending queue.
    fn enqueue(&mut self, request: IoRequest);

    /// Removes and returns the request to service next, given the current head
    /// track, or `None` if nothing is pending.
    fn next(&mut self, current_track: u64) -> Option<IoRequest>;

    /// Returns whether any request is pending.
    fn has_pending(&self) -> bool;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}

/// Creates the strategy selected by name: `fifo`, `look` or `nlook`.
pub fn make_strategy(name: &str, sectors_per_track: u64) -> Result<Box<dyn SchedulerStrategy>, String> {
    match name.to_lowercase().as_str() {
        "fifo" => Ok(Box::new(FifoStrategy::new())),
        "look" => Ok(Box::new(LookStrategy::new(sectors_per_track))),
        "nlook" => Ok(Box::new(NStepLookStrategy::new(sectors_per_track))),
        other => Err(format!(
            "unknown scheduler: {}. Available: fifo, look, nlook",
            other
        )),
    }
}

// Picks the request nearest to the current track in the sweep direction,
// reversing the direction when nothing lies ahead. Ties on track distance are
// broken by arrival order. The queue must not be empty.
fn pick_sweep(
    queue: &[(u64, IoRequest)],
    current_track: u64,
    moving_up: &mut bool,
    sectors_per_track: u64,
) -> usize {
    if let Some(i) = nearest_in_direction(queue, current_track, *moving_up, sectors_per_track) {
        return i;
    }
    *moving_up = !*moving_up;
    nearest_in_direction(queue, current_track, *moving_up, sectors_per_track)
        .expect("sweep selection from an empty queue")
}

fn nearest_in_direction(
    queue: &[(u64, IoRequest)],
    current_track: u64,
    moving_up: bool,
    sectors_per_track: u64,
) -> Option<usize> {
    let mut best: Option<(u64, u64, usize)> = None;
    for (i, (seq, request)) in queue.iter().enumerate() {
        let track = request.track(sectors_per_track);
        let ahead = if moving_up {
            track >= current_track
        } else {
            track <= current_track
        };
        if !ahead {
            continue;
        }
        let distance = track.abs_diff(current_track);
        if best.map_or(true, |(d, s, _)| (distance, *seq) < (d, s)) {
            best = Some((distance, *seq, i));
        }
    }
    best.map(|(_, _, i)| i)
}

/// First-in-first-out strategy: requests are serviced in exact arrival order,
/// irrespective of the head position.
pub struct FifoStrategy {
    queue: VecDeque<IoRequest>,
}

impl FifoStrategy {
    /// Creates an empty FIFO queue.
    pub fn new() -> Self {
        Self { queue: VecDeque::new() }
    }
}

impl Default for FifoStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerStrategy for FifoStrategy {
    fn enqueue(&mut self, request: IoRequest) {
        self.queue.push_back(request);
    }

    fn next(&mut self, _current_track: u64) -> Option<IoRequest> {
        self.queue.pop_front()
    }

    fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    fn name(&self) -> &'static str {
        "FIFO"
    }
}

/// LOOK strategy: the head sweeps in one direction servicing the nearest
/// pending request ahead of it, and reverses only when no pending request lies
/// in the current direction. Requests arriving mid-sweep are serviced in the
/// same pass if their track lies ahead of the head.
pub struct LookStrategy {
    queue: Vec<(u64, IoRequest)>,
    moving_up: bool,
    next_seq: u64,
    sectors_per_track: u64,
}

impl LookStrategy {
    /// Creates an empty LOOK queue sweeping towards higher tracks.
    pub fn new(sectors_per_track: u64) -> Self {
        Self {
            queue: Vec::new(),
            moving_up: true,
            next_seq: 0,
            sectors_per_track,
        }
    }

    /// Returns whether the current sweep moves towards higher tracks.
    pub fn moving_up(&self) -> bool {
        self.moving_up
    }
}

impl SchedulerStrategy for LookStrategy {
    fn enqueue(&mut self, request: IoRequest) {
        self.queue.push((self.next_seq, request));
        self.next_seq += 1;
    }

    fn next(&mut self, current_track: u64) -> Option<IoRequest> {
        if self.queue.is_empty() {
            return None;
        }
        let i = pick_sweep(&self.queue, current_track, &mut self.moving_up, self.sectors_per_track);
        Some(self.queue.remove(i).1)
    }

    fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    fn name(&self) -> &'static str {
        "LOOK"
    }
}

/// N-step-LOOK strategy: the sweep rule of LOOK applied to a batch frozen at
/// the start of each pass. Requests arriving during a pass are held out and
/// become eligible only when the next pass starts, which bounds the sweep
/// length regardless of arrival rate.
pub struct NStepLookStrategy {
    batch: Vec<(u64, IoRequest)>,
    incoming: VecDeque<(u64, IoRequest)>,
    moving_up: bool,
    next_seq: u64,
    sectors_per_track: u64,
}

impl NStepLookStrategy {
    /// Creates an empty N-step-LOOK queue sweeping towards higher tracks.
    pub fn new(sectors_per_track: u64) -> Self {
        Self {
            batch: Vec::new(),
            incoming: VecDeque::new(),
            moving_up: true,
            next_seq: 0,
            sectors_per_track,
        }
    }

    /// Number of requests in the batch of the current pass.
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }
}

impl SchedulerStrategy for NStepLookStrategy {
    fn enqueue(&mut self, request: IoRequest) {
        self.incoming.push_back((self.next_seq, request));
        self.next_seq += 1;
    }

    fn next(&mut self, current_track: u64) -> Option<IoRequest> {
        if self.batch.is_empty() {
            if self.incoming.is_empty() {
                return None;
            }
            // freeze the pending set into the batch of the new pass
            self.batch.extend(self.incoming.drain(..));
        }
        let i = pick_sweep(&self.batch, current_track, &mut self.moving_up, self.sectors_per_track);
        Some(self.batch.remove(i).1)
    }

    fn has_pending(&self) -> bool {
        !self.batch.is_empty() || !self.incoming.is_empty()
    }

    fn name(&self) -> &'static str {
        "NLOOK"
    }
}
