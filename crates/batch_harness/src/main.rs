use anyhow::Result;
use batch_harness::{CollatzSteps, Harness, HarnessConfig, RemainderPolicy, UnitCircle};
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser)]
#[command(name = "batch-harness")]
#[command(about = "Parallel batch computations over a fixed pool of worker threads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Total and average Collatz step counts of 1..=max
    Collatz {
        /// Number of worker threads (0 or negative: number of CPUs)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        workers: i64,
        /// Maximum natural number to compute (inclusive)
        #[arg(long, default_value_t = 10_000_000)]
        max: u64,
    },
    /// Monte-Carlo estimate of pi, once per thread count
    Pi {
        /// Total number of sample points per run
        #[arg(long, default_value_t = 1_000_000)]
        points: u64,
        /// Comma-separated worker counts to sweep
        #[arg(long, value_delimiter = ',', default_value = "1,2,4,8,16,32,64")]
        threads: Vec<usize>,
        /// Base seed for the worker RNGs (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Give the remainder of points/threads to the last worker instead of dropping it
        #[arg(long)]
        redistribute: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_thread_names(cli.verbose >= 1)
        .init();

    debug!("batch-harness started with verbosity level: {}", cli.verbose);

    match cli.command {
        Commands::Collatz { workers, max } => run_collatz(workers, max),
        Commands::Pi {
            points,
            threads,
            seed,
            redistribute,
        } => run_pi(points, &threads, seed, redistribute),
    }
}

fn run_collatz(workers: i64, max: u64) -> Result<()> {
    // non-positive counts fall back to the number of CPUs
    let workers = usize::try_from(workers).unwrap_or(0);
    let harness = Harness::new(
        HarnessConfig::builder()
            .num_workers(workers)
            .total_work(max)
            .build(),
    )?;

    println!(
        "Collatz parallel run: max={}, workers={}",
        max,
        harness.workers()
    );

    let summary = harness.run_stream(CollatzSteps)?;

    println!("Done. Total steps = {}", summary.accumulator);
    println!("Average steps per number = {:.6}", summary.mean());
    println!("Elapsed = {:?}", summary.elapsed);
    Ok(())
}

fn run_pi(points: u64, threads: &[usize], seed: Option<u64>, redistribute: bool) -> Result<()> {
    let mut builder = HarnessConfig::builder().total_work(points).remainder(if redistribute {
        RemainderPolicy::Redistribute
    } else {
        RemainderPolicy::Truncate
    });
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let harness = Harness::new(builder.build())?;

    println!("Monte-Carlo estimate of pi ({} points)", points);
    for summary in harness.sweep_partitioned(threads, UnitCircle)? {
        println!(
            "{:2} workers: pi ≈ {:.6}, points = {}, time = {:?}",
            summary.workers,
            summary.pi_estimate(),
            summary.effective_total,
            summary.elapsed
        );
    }
    Ok(())
}
