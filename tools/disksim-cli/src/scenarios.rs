//! Execution scenarios: ordered per-process request traces.

use disksim::config::SimConfig;
use disksim::request::OpKind;
use disksim_core::Simulation;

/// Ordered sequence of operations of one process.
pub type Trace = Vec<(OpKind, u64)>;

/// Builds the per-process traces of the named scenario.
///
/// The `random` scenario draws from the simulation-wide seeded generator, so
/// repeated runs over the same configuration produce identical traces.
pub fn build(name: &str, config: &SimConfig, sim: &mut Simulation) -> Result<Vec<Trace>, String> {
    match name.to_lowercase().as_str() {
        "default" => Ok(default_traces(config)),
        "sequential" => Ok(sequential_traces(config)),
        "random" => Ok(random_traces(config, sim)),
        "cache-test" => Ok(cache_test_traces(config)),
        other => Err(format!(
            "unknown scenario: {}. Available: default, sequential, random, cache-test",
            other
        )),
    }
}

// Mixed reads and writes over different disk areas, with repeat accesses
// that exercise the buffer cache.
fn default_traces(config: &SimConfig) -> Vec<Trace> {
    let mut traces = vec![vec![
        (OpKind::Read, 1250),
        (OpKind::Write, 1700),
        (OpKind::Read, 1250),
        (OpKind::Read, 500),
    ]];
    if config.processes >= 2 {
        traces.push(vec![
            (OpKind::Read, 5000),
            (OpKind::Read, 5100),
            (OpKind::Write, 3000),
        ]);
    }
    if config.processes >= 3 {
        traces.push(vec![
            (OpKind::Read, 2500),
            (OpKind::Write, 2600),
            (OpKind::Read, 2500),
        ]);
    }
    traces
}

// Ascending runs of nearby sectors, the favourable case for the sweep
// schedulers.
fn sequential_traces(config: &SimConfig) -> Vec<Trace> {
    let mut traces = Vec::new();
    let base_sector = 1000;
    for i in 0..config.processes as u64 {
        let start = base_sector + i * 2000;
        let trace = (0..10)
            .map(|j| {
                let op = if j % 2 == 0 { OpKind::Read } else { OpKind::Write };
                (op, start + j * 100)
            })
            .collect();
        traces.push(trace);
    }
    traces
}

// Uniform accesses over the whole disk, the hardest case for any scheduler.
fn random_traces(config: &SimConfig, sim: &mut Simulation) -> Vec<Trace> {
    let total_sectors = config.tracks * config.sectors_per_track;
    let mut traces = Vec::new();
    for _ in 0..config.processes {
        let trace = (0..15)
            .map(|_| {
                let sector = sim.gen_range(0..total_sectors);
                let op = if sim.gen_range(0..2u32) == 0 {
                    OpKind::Read
                } else {
                    OpKind::Write
                };
                (op, sector)
            })
            .collect();
        traces.push(trace);
    }
    traces
}

// Repeat-heavy access patterns demonstrating the two-segment cache.
fn cache_test_traces(config: &SimConfig) -> Vec<Trace> {
    let mut traces = vec![vec![
        (OpKind::Read, 100),
        (OpKind::Read, 200),
        (OpKind::Read, 100),
        (OpKind::Read, 200),
        (OpKind::Read, 300),
        (OpKind::Read, 100),
        (OpKind::Write, 200),
        (OpKind::Read, 100),
    ]];
    if config.processes >= 2 {
        traces.push(vec![
            (OpKind::Read, 500),
            (OpKind::Read, 600),
            (OpKind::Read, 500),
            (OpKind::Read, 600),
            (OpKind::Read, 500),
        ]);
    }
    if config.processes >= 3 {
        traces.push(vec![
            (OpKind::Read, 1000),
            (OpKind::Write, 1000),
            (OpKind::Read, 1100),
            (OpKind::Read, 1000),
            (OpKind::Read, 1100),
        ]);
    }
    traces
}
