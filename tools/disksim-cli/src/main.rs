mod scenarios;

use std::fs::File;
use std::io::Write;

use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;
use sugars::{rc, refcell};

use disksim::cache::BufferCache;
use disksim::config::SimConfig;
use disksim::disk::DiskDrive;
use disksim::geometry::DiskGeometry;
use disksim::kernel::{CpuCosts, Kernel, ProcessSummary};
use disksim::process::Process;
use disksim::scheduler::make_strategy;
use disksim::stats::Statistics;
use disksim_core::Simulation;

const SEED: u64 = 42;

/// Disk I/O subsystem simulator
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// I/O scheduling strategy (fifo, look, nlook)
    #[clap(long)]
    scheduler: String,

    /// Number of user processes
    #[clap(long, default_value_t = 2)]
    processes: u32,

    /// CPU time quantum in ms
    #[clap(long, default_value_t = 20.0)]
    quantum: f64,

    /// Number of buffers in the cache
    #[clap(long, default_value_t = 10)]
    buffers: usize,

    /// Upper bound of the hot cache segment
    #[clap(long, default_value_t = 5)]
    hot_buffers: usize,

    /// Number of disk tracks
    #[clap(long, default_value_t = 10000)]
    tracks: u64,

    /// Sectors per track
    #[clap(long, default_value_t = 500)]
    sectors_per_track: u64,

    /// Disk rotation speed in RPM
    #[clap(long, default_value_t = 7500)]
    rpm: u32,

    /// Head movement time per track in ms
    #[clap(long, default_value_t = 0.5)]
    seek_time: f64,

    /// System call duration in ms
    #[clap(long, default_value_t = 0.15)]
    syscall_time: f64,

    /// Interrupt handler duration in ms
    #[clap(long, default_value_t = 0.05)]
    interrupt_time: f64,

    /// Per-request compute time in ms
    #[clap(long, default_value_t = 7.0)]
    compute_time: f64,

    /// Execution scenario (default, sequential, random, cache-test)
    #[clap(long, default_value = "default")]
    scenario: String,

    /// Write the event log and the final report to a file
    #[clap(long)]
    output: Option<String>,

    /// Verbose output
    #[clap(long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> SimConfig {
        SimConfig {
            scheduler: self.scheduler.clone(),
            processes: self.processes,
            quantum: self.quantum,
            buffers: self.buffers,
            hot_buffers: self.hot_buffers,
            tracks: self.tracks,
            sectors_per_track: self.sectors_per_track,
            rpm: self.rpm,
            seek_time_per_track: self.seek_time,
            syscall_time: self.syscall_time,
            interrupt_time: self.interrupt_time,
            compute_time: self.compute_time,
            scenario: self.scenario.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();
    if let Err(message) = run(&args) {
        eprintln!("Configuration error: {}", message);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = args.to_config();
    config.validate()?;

    // the strategy is built up front so that a bad name fails before
    // any output is produced
    let strategy = make_strategy(&config.scheduler, config.sectors_per_track)?;

    let mut report: Box<dyn Write> = setup_output(args)?;
    print_configuration(&config, args, &mut report)?;

    let mut sim = Simulation::new(SEED);
    let traces = scenarios::build(&config.scenario, &config, &mut sim)?;

    let stats = rc!(refcell!(Statistics::new()));
    let stats_id = sim.add_handler("stats", stats.clone());

    let geometry = DiskGeometry::new(
        config.tracks,
        config.sectors_per_track,
        config.seek_time_per_track,
        config.rpm,
    );
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

    sim.step_until_no_events();

    print_report(&sim, &kernel.borrow(), &stats.borrow(), &mut report)
        .map_err(|e| format!("cannot write report: {}", e))?;

    if let Some(path) = &args.output {
        println!("Results saved to {}", path);
    }
    Ok(())
}

// Configures env_logger and returns the sink for the final report. Both the
// event log and the report go either to stdout or to the --output file.
fn setup_output(args: &Args) -> Result<Box<dyn Write>, String> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = Builder::new();
    builder
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter_level(level)
        .parse_default_env();

    let report: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file =
                File::create(path).map_err(|e| format!("cannot open {}: {}", path, e))?;
            let log_file = file
                .try_clone()
                .map_err(|e| format!("cannot open {}: {}", path, e))?;
            builder.target(Target::Pipe(Box::new(log_file)));
            Box::new(file)
        }
        None => {
            builder.target(Target::Stdout);
            Box::new(std::io::stdout())
        }
    };
    builder.init();
    Ok(report)
}

fn print_configuration(
    config: &SimConfig,
    args: &Args,
    out: &mut Box<dyn Write>,
) -> Result<(), String> {
    let write = |out: &mut Box<dyn Write>| -> std::io::Result<()> {
        writeln!(out, "System configuration:")?;
        writeln!(out, "  I/O scheduler: {}", config.scheduler.to_uppercase())?;
        writeln!(out, "  Processes: {}", config.processes)?;
        writeln!(out, "  Scenario: {}", config.scenario)?;
        writeln!(out, "  Time quantum: {} ms", config.quantum)?;
        writeln!(out)?;
        writeln!(out, "Disk parameters:")?;
        writeln!(out, "  Tracks: {}", config.tracks)?;
        writeln!(out, "  Sectors per track: {}", config.sectors_per_track)?;
        writeln!(out, "  Rotation speed: {} RPM", config.rpm)?;
        writeln!(out, "  Seek time per track: {} ms", config.seek_time_per_track)?;
        writeln!(out)?;
        writeln!(out, "Buffer cache parameters:")?;
        writeln!(out, "  Buffers: {}", config.buffers)?;
        writeln!(out, "  Hot segment bound: {}", config.hot_buffers)?;
        writeln!(out)?;
        if let Some(path) = &args.output {
            writeln!(out, "Results will be saved to {}", path)?;
            writeln!(out)?;
        }
        writeln!(out, "{}", "-".repeat(80))?;
        out.flush()
    };
    write(out).map_err(|e| format!("cannot write output: {}", e))
}

fn print_report(
    sim: &Simulation,
    kernel: &Kernel,
    stats: &Statistics,
    out: &mut Box<dyn Write>,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "SIMULATION STATISTICS:")?;
    writeln!(out, "  Total simulated time: {:.2} ms", sim.time())?;
    writeln!(out, "  Head seeks: {}", stats.seeks())?;
    writeln!(out, "  Total head travel: {} tracks", stats.total_seek_distance())?;
    writeln!(out, "  Total seek time: {:.2} ms", stats.total_seek_time())?;
    writeln!(out, "  Average seek time: {:.2} ms", stats.avg_seek_time())?;
    writeln!(out)?;
    writeln!(out, "BUFFER CACHE STATISTICS:")?;
    writeln!(out, "  Hits: {}", stats.cache_hits())?;
    writeln!(out, "  Misses: {}", stats.cache_misses())?;
    writeln!(out, "  Hit rate: {:.2}%", stats.cache_hit_rate())?;
    writeln!(
        out,
        "  Cold segment: {} buffers, hot segment: {} buffers",
        kernel.cache().cold_len(),
        kernel.cache().hot_len()
    )?;
    writeln!(out)?;
    writeln!(out, "REQUEST STATISTICS:")?;
    writeln!(out, "  Requests issued: {}", stats.requests_issued())?;
    writeln!(out, "  Requests completed on disk: {}", stats.requests_completed())?;
    writeln!(out, "  Average wait time: {:.2} ms", stats.avg_wait_time())?;
    writeln!(out, "  Maximum wait time: {:.2} ms", stats.max_wait_time())?;
    writeln!(out, "  Quantum expirations: {}", stats.quantum_expirations())?;
    writeln!(out)?;
    writeln!(out, "PROCESS STATISTICS:")?;
    let summaries = kernel.process_summaries();
    writeln!(out, "  Processes: {}", summaries.len())?;
    writeln!(out, "  Terminated: {}", stats.terminated_processes())?;
    for ProcessSummary {
        pid,
        completed,
        total,
        state,
    } in summaries
    {
        writeln!(
            out,
            "  Process {}: {}/{} operations, state: {:?}",
            pid, completed, total, state
        )?;
    }
    out.flush()
}
