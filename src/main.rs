// TCTRUNC -- TRIGGER-CELL TRUNCATION BUDGETS
// PER-BIN CAPACITY VECTORS FOR TWO CORRELATED REGIONS UNDER TWO GLOBAL CAPS
//
// ALGORITHMS LIVE IN THE LIBRARY (src/lib.rs)
// THE BINARY HANDLES: ARGUMENTS, LOADING, REPORTING

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use cli::summary::DEFAULT_PROFILE_DIVISOR;
use tctrunc::budget::{DEFAULT_SMOOTHING_PASSES, DEFAULT_SMOOTHING_WINDOW};
use tctrunc::threshold::{
    DEFAULT_FALLBACK_THRESHOLD, DEFAULT_MAX_THRESHOLD, DEFAULT_RETENTION, DEFAULT_TARGET_TOTAL,
};

#[derive(Parser)]
#[command(name = "tctrunc")]
#[command(version)]
#[command(about = "TCTRUNC -- PER-BIN TRIGGER-CELL TRUNCATION BUDGETS")]
struct Cli {
    #[command(subcommand)]
    command: SubCmd,

    // LOG VERBOSITY: -v DEBUG, -vv TRACE
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum SubCmd {
    // BIN BUDGETS + REVERSE THRESHOLDS + RETENTION PER SELECTED OPTION
    Study(StudyArgs),

    // MINIMIZE THE TWO-REGION PENALTY OVER ONE TRUNCATION FACTOR
    Optimize(OptimizeArgs),

    // PER-BUNDLE MAX / MEAN / MEAN+STD PROFILES
    Summary(SummaryArgs),

    // UNIFORM CUTS AT THE 99/95/90TH PERCENTILE AND WHAT THEY COST
    Truncation(TruncationArgs),
}

#[derive(Parser)]
pub struct InputArgs {
    // EVENT ARCHIVE: JSON [event][division][bundle][bin], .gz ACCEPTED
    #[arg(long)]
    events: PathBuf,

    // OPTION TABLE (JSON: name -> {nLinks, maxTCsA, maxTCsB})
    #[arg(long)]
    config: PathBuf,

    // OPTIONS TO PROCESS, E.G. "1,2,4-5"
    #[arg(long, default_value = "1-5")]
    options: String,
}

#[derive(Parser)]
pub struct StudyArgs {
    #[command(flatten)]
    input: InputArgs,

    // SMOOTHING PASSES: LARGEST BINS GIVE TO THE SMALLEST
    #[arg(long, default_value_t = DEFAULT_SMOOTHING_PASSES)]
    smoothing_passes: usize,

    // BINS ON EACH SIDE OF A SMOOTHING PASS
    #[arg(long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    smoothing_window: usize,

    // FRACTION OF EACH BIN'S LOAD THE REVERSE THRESHOLDS RETAIN
    #[arg(long, default_value_t = DEFAULT_RETENTION)]
    retention: f64,

    // HIGHEST THRESHOLD THE REVERSE SEARCH CONSIDERS
    #[arg(long, default_value_t = DEFAULT_MAX_THRESHOLD)]
    max_threshold: u32,

    // THRESHOLD FOR BINS THE SEARCH CANNOT PLACE (EMPTY BINS)
    #[arg(long, default_value_t = DEFAULT_FALLBACK_THRESHOLD)]
    fallback: u32,

    // REGION A TOTAL THE REVERSE THRESHOLDS ARE BROUGHT TO
    #[arg(long, default_value_t = DEFAULT_TARGET_TOTAL)]
    target_total: i64,

    // FAIL INSTEAD OF TRIMMING WHEN SEARCHED THRESHOLDS OVERSHOOT THE TOTAL
    #[arg(long)]
    reject_overallocation: bool,

    // ALSO WRITE THE REPORT HERE
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct OptimizeArgs {
    #[command(flatten)]
    input: InputArgs,

    // ABSOLUTE TOLERANCE ON THE TRUNCATION FACTOR
    #[arg(long, default_value_t = 1e-5)]
    xatol: f64,

    // ITERATION LIMIT FOR THE BOUNDED SEARCH
    #[arg(long, default_value_t = 500)]
    max_iter: u32,
}

#[derive(Parser)]
pub struct SummaryArgs {
    // EVENT ARCHIVE: JSON [event][division][bundle][bin], .gz ACCEPTED
    #[arg(long)]
    events: PathBuf,

    // PROFILE X + Y ONLY, WITHOUT THE 2 x Y ENVELOPE
    #[arg(long)]
    inclusive_only: bool,

    // EVERY COUNT IS DIVIDED BY THIS BEFORE PROFILING
    #[arg(long, default_value_t = DEFAULT_PROFILE_DIVISOR)]
    divisor: f64,
}

#[derive(Parser)]
pub struct TruncationArgs {
    // EVENT ARCHIVE: JSON [event][division][bundle][bin], .gz ACCEPTED
    #[arg(long)]
    events: PathBuf,

    // CUT X + Y ONLY, WITHOUT THE 2 x Y ENVELOPE
    #[arg(long)]
    inclusive_only: bool,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        level,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        SubCmd::Study(args) => cli::study::run_study(&args),
        SubCmd::Optimize(args) => cli::optimize::run_optimize(&args),
        SubCmd::Summary(args) => cli::summary::run_summary(&args),
        SubCmd::Truncation(args) => cli::truncation::run_truncation(&args),
    }
}
