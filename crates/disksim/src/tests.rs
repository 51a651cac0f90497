use std::cell::RefCell;
use std::rc::Rc;

use sugars::{rc, refcell};

use disksim_core::Simulation;

use crate::cache::{BufferCache, Segment};
use crate::config::SimConfig;
use crate::disk::DiskDrive;
use crate::geometry::DiskGeometry;
use crate::kernel::{CpuCosts, Kernel};
use crate::process::{Process, ProcessState};
use crate::request::{IoRequest, OpKind};
use crate::scheduler::{make_strategy, FifoStrategy, LookStrategy, NStepLookStrategy, SchedulerStrategy};
use crate::stats::Statistics;

const SEED: u64 = 16;

///////////////////////////////////////////////////////////////////////////////

fn request(sector: u64) -> IoRequest {
    IoRequest {
        pid: 1,
        sector,
        op: OpKind::Read,
        issue_time: 0.0,
        requester: 0,
    }
}

fn make_cache(capacity: usize, hot_capacity: usize) -> (Simulation, BufferCache) {
    let mut sim = Simulation::new(SEED);
    let stats = rc!(refcell!(Statistics::new()));
    let stats_id = sim.add_handler("stats", stats);
    let cache = BufferCache::new(capacity, hot_capacity, stats_id, sim.create_context("Buffer cache"));
    (sim, cache)
}

fn build_system(
    config: &SimConfig,
    traces: Vec<Vec<(OpKind, u64)>>,
) -> (Simulation, Rc<RefCell<Kernel>>, Rc<RefCell<Statistics>>) {
    let mut sim = Simulation::new(SEED);

    let stats = rc!(refcell!(Statistics::new()));
    let stats_id = sim.add_handler("stats", stats.clone());

    let geometry = DiskGeometry::new(
        config.tracks,
        config.sectors_per_track,
        config.seek_time_per_track,
        config.rpm,
    );
    let strategy = make_strategy(&config.scheduler, config.sectors_per_track).unwrap();
    let drive = rc!(refcell!(DiskDrive::new(
        geometry,
        strategy,
        stats_id,
        sim.create_context("Disk"),
    )));
    sim.add_handler("Disk", drive.clone());

    let cache = BufferCache::new(
        config.buffers,
        config.hot_buffers,
        stats_id,
        sim.create_context("Buffer cache"),
    );

    let mut processes = Vec::new();
    for (i, trace) in traces.into_iter().enumerate() {
        let pid = i as u32 + 1;
        let ctx = sim.create_context(format!("Process {}", pid));
        processes.push(Process::new(pid, trace, ctx));
    }

    let costs = CpuCosts {
        quantum: config.quantum,
        syscall_time: config.syscall_time,
        interrupt_time: config.interrupt_time,
        compute_time: config.compute_time,
    };
    let kernel = rc!(refcell!(Kernel::new(
        processes,
        cache,
        drive,
        costs,
        stats_id,
        sim.create_context("Kernel"),
    )));
    sim.add_handler("Kernel", kernel.clone());
    kernel.borrow_mut().start();

    (sim, kernel, stats)
}

///////////////////////////////////////////////////////////////////////////////
// Geometry

#[test]
fn seek_time_is_linear_in_track_distance() {
    let geometry = DiskGeometry::new(10_000, 500, 0.5, 7500);
    assert_eq!(geometry.seek_time(0, 0), 0.0);
    assert_eq!(geometry.seek_time(0, 1), 0.5);
    assert_eq!(geometry.seek_time(0, 2), 1.0);
    assert_eq!(geometry.seek_time(7, 3), 2.0);
    assert_eq!(geometry.seek_time(3, 7), 2.0);
    assert_eq!(geometry.seek_time(0, 9999), 4999.5);
}

#[test]
fn rotational_latency_is_half_rotation() {
    let geometry = DiskGeometry::new(10_000, 500, 0.5, 7500);
    assert_eq!(geometry.rotation_period(), 8.0);
    assert_eq!(geometry.rotational_latency(), 4.0);

    let slow = DiskGeometry::new(10_000, 500, 0.5, 5400);
    assert_eq!(slow.rotational_latency(), 30_000.0 / 5400.0);
}

#[test]
fn sector_decomposes_into_track_and_offset() {
    let geometry = DiskGeometry::new(10_000, 500, 0.5, 7500);
    assert_eq!(geometry.track_of(0), 0);
    assert_eq!(geometry.track_of(499), 0);
    assert_eq!(geometry.track_of(500), 1);
    assert_eq!(geometry.track_of(1250), 2);
    assert_eq!(geometry.offset_of(1250), 250);
    assert_eq!(geometry.capacity(), 5_000_000);
}

#[test]
#[should_panic]
fn out_of_bounds_sector_is_rejected() {
    let geometry = DiskGeometry::new(10, 10, 0.5, 7500);
    geometry.track_of(100);
}

///////////////////////////////////////////////////////////////////////////////
// Buffer cache

#[test]
fn inserted_sector_hits_until_evicted() {
    let (_sim, mut cache) = make_cache(3, 2);
    cache.insert(100, false);
    assert!(cache.lookup(100, 1, OpKind::Read));
    cache.insert(200, false);
    cache.insert(300, false);
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert!(cache.lookup(200, 1, OpKind::Read));
    assert!(cache.lookup(300, 1, OpKind::Read));
    assert_eq!(cache.len(), 3);
}

#[test]
fn occupancy_never_exceeds_capacity() {
    let (_sim, mut cache) = make_cache(4, 2);
    for sector in 0..20 {
        cache.insert(sector, false);
        assert!(cache.len() <= 4);
    }
    assert_eq!(cache.len(), 4);
}

#[test]
fn second_reference_promotes_to_hot() {
    let (_sim, mut cache) = make_cache(4, 2);
    cache.insert(100, false);
    assert_eq!(cache.segment_of(100), Some(Segment::Cold));
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert_eq!(cache.segment_of(100), Some(Segment::Hot));
    // further references keep it hot
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert_eq!(cache.segment_of(100), Some(Segment::Hot));
}

#[test]
fn eviction_takes_cold_lru_first() {
    let (_sim, mut cache) = make_cache(3, 2);
    cache.insert(100, false);
    cache.insert(200, false);
    cache.insert(300, false);
    // 100 becomes hot, 200 is now the cold LRU
    assert!(cache.lookup(100, 1, OpKind::Read));
    cache.insert(400, false);
    assert!(!cache.contains(200));
    assert!(cache.contains(100));
    assert!(cache.contains(300));
    assert!(cache.contains(400));
}

#[test]
fn hot_blocks_survive_while_cold_remain() {
    let (_sim, mut cache) = make_cache(3, 2);
    cache.insert(100, false);
    cache.insert(200, false);
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert!(cache.lookup(200, 1, OpKind::Read));
    // both are hot; a stream of one-shot insertions may only thrash
    // the remaining cold buffer
    for sector in 300..310 {
        cache.insert(sector, false);
        assert!(cache.contains(100));
        assert!(cache.contains(200));
    }
}

#[test]
fn hot_overflow_demotes_lru_back_to_cold() {
    let (_sim, mut cache) = make_cache(5, 2);
    for sector in [100, 200, 300] {
        cache.insert(sector, false);
    }
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert!(cache.lookup(200, 1, OpKind::Read));
    assert_eq!(cache.hot_len(), 2);
    // promoting a third block overflows the hot bound and demotes 100
    assert!(cache.lookup(300, 1, OpKind::Read));
    assert_eq!(cache.hot_len(), 2);
    assert_eq!(cache.segment_of(100), Some(Segment::Cold));
    assert_eq!(cache.segment_of(200), Some(Segment::Hot));
    assert_eq!(cache.segment_of(300), Some(Segment::Hot));
}

#[test]
fn full_cache_always_keeps_a_cold_victim() {
    let (_sim, mut cache) = make_cache(2, 1);
    cache.insert(100, false);
    cache.insert(200, false);
    assert!(cache.lookup(100, 1, OpKind::Read));
    assert!(cache.lookup(200, 1, OpKind::Read));
    // the hot bound demoted 100 back to cold, so eviction finds a cold victim
    assert_eq!(cache.segment_of(100), Some(Segment::Cold));
    assert_eq!(cache.segment_of(200), Some(Segment::Hot));
    cache.insert(300, false);
    assert!(!cache.contains(100));
    assert!(cache.contains(200));
    assert_eq!(cache.len(), 2);
}

#[test]
fn writes_mark_blocks_dirty() {
    let (_sim, mut cache) = make_cache(3, 2);
    cache.insert(100, false);
    assert!(!cache.is_dirty(100));
    assert!(cache.lookup(100, 1, OpKind::Write));
    assert!(cache.is_dirty(100));
    cache.insert(200, true);
    assert!(cache.is_dirty(200));
}

#[test]
fn capacity_one_cache_thrashes_on_alternating_sectors() {
    let (_sim, mut cache) = make_cache(1, 0);
    for _ in 0..4 {
        assert!(!cache.lookup(100, 1, OpKind::Read));
        cache.insert(100, false);
        assert!(!cache.lookup(200, 1, OpKind::Read));
        cache.insert(200, false);
    }
    assert_eq!(cache.len(), 1);
}

///////////////////////////////////////////////////////////////////////////////
// Scheduling strategies

#[test]
fn fifo_returns_requests_in_enqueue_order() {
    let mut fifo = FifoStrategy::new();
    let sectors = [5000, 10, 777, 777, 42];
    for sector in sectors {
        fifo.enqueue(request(sector));
    }
    let mut served = Vec::new();
    while let Some(r) = fifo.next(3) {
        served.push(r.sector);
    }
    assert_eq!(served, sectors);
    assert!(!fifo.has_pending());
    assert!(fifo.next(3).is_none());
}

#[test]
fn look_sweeps_up_then_reverses() {
    // sectors_per_track = 10, so sector 50 is on track 5 etc.
    let mut look = LookStrategy::new(10);
    for sector in [50, 10, 90, 30] {
        look.enqueue(request(sector));
    }
    // head at track 4, moving up: 5, 9, then reverse: 3, 1
    let mut served = Vec::new();
    let mut head = 4;
    while let Some(r) = look.next(head) {
        head = r.track(10);
        served.push(head);
    }
    assert_eq!(served, vec![5, 9, 3, 1]);
}

#[test]
fn look_direction_is_monotonic_within_a_sweep() {
    let mut look = LookStrategy::new(10);
    for sector in [80, 20, 60, 40, 0, 95] {
        look.enqueue(request(sector));
    }
    let mut head = 5;
    let mut tracks = Vec::new();
    while let Some(r) = look.next(head) {
        head = r.track(10);
        tracks.push(head);
    }
    // up sweep is non-decreasing, down sweep non-increasing
    let split = tracks.iter().position(|&t| t < 5).unwrap();
    assert!(tracks[..split].windows(2).all(|w| w[0] <= w[1]));
    assert!(tracks[split..].windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn look_services_mid_sweep_arrivals_ahead_of_head() {
    let mut look = LookStrategy::new(10);
    look.enqueue(request(50));
    look.enqueue(request(90));
    let first = look.next(0).unwrap();
    assert_eq!(first.track(10), 5);
    // arrives while sweeping up, ahead of the head: same pass
    look.enqueue(request(70));
    assert_eq!(look.next(5).unwrap().track(10), 7);
    assert_eq!(look.next(7).unwrap().track(10), 9);
}

#[test]
fn look_breaks_track_ties_by_arrival_order() {
    let mut look = LookStrategy::new(10);
    look.enqueue(request(51));
    look.enqueue(request(55));
    let first = look.next(5).unwrap();
    let second = look.next(5).unwrap();
    assert_eq!(first.sector, 51);
    assert_eq!(second.sector, 55);
}

#[test]
fn nlook_freezes_batch_at_pass_start() {
    let mut nlook = NStepLookStrategy::new(10);
    nlook.enqueue(request(50));
    nlook.enqueue(request(10));
    // pass starts here with batch {5, 1}
    let first = nlook.next(4).unwrap();
    assert_eq!(first.track(10), 5);
    // arrives mid-pass ahead of the head, but must wait for the next pass
    nlook.enqueue(request(90));
    assert_eq!(nlook.next(5).unwrap().track(10), 1);
    assert_eq!(nlook.batch_len(), 0);
    // next pass picks up the held-out request
    assert_eq!(nlook.next(1).unwrap().track(10), 9);
    assert!(nlook.next(9).is_none());
}

#[test]
fn nlook_orders_batch_by_sweep_direction() {
    let mut nlook = NStepLookStrategy::new(10);
    for sector in [30, 70, 10, 50] {
        nlook.enqueue(request(sector));
    }
    let mut head = 2;
    let mut tracks = Vec::new();
    while let Some(r) = nlook.next(head) {
        head = r.track(10);
        tracks.push(head);
    }
    assert_eq!(tracks, vec![3, 5, 7, 1]);
}

#[test]
fn unknown_strategy_name_is_rejected() {
    assert!(make_strategy("fifo", 500).is_ok());
    assert!(make_strategy("LOOK", 500).is_ok());
    assert!(make_strategy("nlook", 500).is_ok());
    assert!(make_strategy("sstf", 500).is_err());
    assert!(make_strategy("", 500).is_err());
}

///////////////////////////////////////////////////////////////////////////////
// Full system

#[test]
fn single_request_timing_matches_the_model() {
    // rpm 7500 -> rotation 8.00 ms, latency 4.00 ms, transfer 0.016 ms;
    // sector 1000 is on track 2, so the seek from track 0 takes 1.00 ms
    let config = SimConfig {
        scheduler: "fifo".to_string(),
        processes: 1,
        ..SimConfig::default()
    };
    let (mut sim, kernel, stats) = build_system(&config, vec![vec![(OpKind::Read, 1000)]]);
    sim.step_until_no_events();

    assert!(kernel.borrow().all_terminated());
    let expected = config.syscall_time + 1.0 + 4.0 + 8.0 / 500.0 + config.interrupt_time;
    assert!((sim.time() - expected).abs() < 1e-9);
    let stats = stats.borrow();
    assert_eq!(stats.seeks(), 1);
    assert_eq!(stats.total_seek_distance(), 2);
    assert!((stats.total_seek_time() - 1.0).abs() < 1e-9);
    assert_eq!(stats.cache_misses(), 1);
    assert_eq!(stats.cache_hits(), 0);
}

#[test]
fn processes_run_to_termination_and_counters_agree() {
    let config = SimConfig {
        scheduler: "look".to_string(),
        ..SimConfig::default()
    };
    let traces = vec![
        vec![
            (OpKind::Read, 1250),
            (OpKind::Write, 1700),
            (OpKind::Read, 1250),
            (OpKind::Read, 500),
        ],
        vec![(OpKind::Read, 5000), (OpKind::Read, 5100), (OpKind::Write, 3000)],
    ];
    let (mut sim, kernel, stats) = build_system(&config, traces);
    sim.step_until_no_events();

    let kernel = kernel.borrow();
    assert!(kernel.all_terminated());
    for summary in kernel.process_summaries() {
        assert_eq!(summary.state, ProcessState::Terminated);
        assert_eq!(summary.completed, summary.total);
    }

    let stats = stats.borrow();
    assert_eq!(stats.requests_issued(), 7);
    assert_eq!(stats.cache_hits() + stats.cache_misses(), 7);
    // the repeat access to sector 1250 is served from the cache
    assert!(stats.cache_hits() >= 1);
    assert_eq!(stats.requests_completed(), stats.cache_misses());
    assert_eq!(stats.terminated_processes(), 2);
}

#[test]
fn quantum_expiry_preempts_and_resumes() {
    // compute time exceeds the quantum, so the cache-hit chain is preempted
    let config = SimConfig {
        scheduler: "fifo".to_string(),
        processes: 1,
        quantum: 5.0,
        ..SimConfig::default()
    };
    let trace = vec![(OpKind::Read, 100), (OpKind::Read, 100), (OpKind::Read, 100)];
    let (mut sim, kernel, stats) = build_system(&config, vec![trace]);
    sim.step_until_no_events();

    assert!(kernel.borrow().all_terminated());
    let stats = stats.borrow();
    assert_eq!(stats.cache_misses(), 1);
    assert_eq!(stats.cache_hits(), 2);
    assert_eq!(stats.quantum_expirations(), 1);
}

#[test]
fn alternating_sectors_thrash_a_single_buffer() {
    let config = SimConfig {
        scheduler: "fifo".to_string(),
        processes: 1,
        buffers: 1,
        hot_buffers: 0,
        ..SimConfig::default()
    };
    let trace = vec![
        (OpKind::Read, 100),
        (OpKind::Read, 200),
        (OpKind::Read, 100),
        (OpKind::Read, 200),
        (OpKind::Read, 100),
        (OpKind::Read, 200),
    ];
    let (mut sim, kernel, stats) = build_system(&config, vec![trace]);
    sim.step_until_no_events();

    assert!(kernel.borrow().all_terminated());
    let stats = stats.borrow();
    assert_eq!(stats.cache_hits(), 0);
    assert_eq!(stats.cache_misses(), 6);
    assert_eq!(stats.requests_completed(), 6);
}

#[test]
fn identical_runs_are_deterministic() {
    let run = || {
        let config = SimConfig {
            scheduler: "nlook".to_string(),
            ..SimConfig::default()
        };
        let traces = vec![
            vec![(OpKind::Read, 1250), (OpKind::Write, 9999), (OpKind::Read, 1250)],
            vec![(OpKind::Read, 320_000), (OpKind::Read, 100), (OpKind::Write, 320_000)],
        ];
        let (mut sim, _kernel, stats) = build_system(&config, traces);
        sim.step_until_no_events();
        let stats = stats.borrow();
        (
            sim.time(),
            sim.event_count(),
            stats.cache_hits(),
            stats.cache_misses(),
            stats.seeks(),
            stats.total_seek_distance(),
            stats.total_seek_time(),
            stats.requests_completed(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn schedulers_service_the_same_workload() {
    // the set of completed requests must not depend on the strategy,
    // only their order and timing may differ
    let traces = || {
        vec![
            vec![(OpKind::Read, 400_000), (OpKind::Read, 100), (OpKind::Read, 200_000)],
            vec![(OpKind::Write, 5000), (OpKind::Read, 450_000), (OpKind::Read, 5000)],
        ]
    };
    let mut completions = Vec::new();
    for scheduler in ["fifo", "look", "nlook"] {
        let config = SimConfig {
            scheduler: scheduler.to_string(),
            ..SimConfig::default()
        };
        let (mut sim, kernel, stats) = build_system(&config, traces());
        sim.step_until_no_events();
        assert!(kernel.borrow().all_terminated(), "{} did not finish", scheduler);
        completions.push(stats.borrow().requests_completed());
    }
    assert_eq!(completions[0], completions[1]);
    assert_eq!(completions[1], completions[2]);
}
