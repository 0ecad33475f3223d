//! Repayment simulator CLI
//!
//! Loads the configuration (writing a sample one on first run), runs the
//! avalanche simulation and prints the optimization report.
//!
//! Usage:
//!   repay-sim --config config/dependencies.json
//!   repay-sim --mode semi-monthly --history-csv history.csv
//!
//! Environment:
//!   REPAY_CONFIG - Configuration file path (default: config/dependencies.json)
//!   RUST_LOG - Log filter (default: repay_sim=info,repayment_simulator_core_rs=info)

mod history;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use repayment_simulator_core_rs::config::{ensure_default_config, load_config, DEFAULT_CONFIG_PATH};
use repayment_simulator_core_rs::{CadencePolicy, Orchestrator, PeriodMode, RunOutcome};

/// Exit code for a run that hit the safety bound
const EXIT_ABORTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "repay-sim")]
#[command(about = "Simulate avalanche repayment of interest-bearing obligations")]
struct Args {
    /// Configuration file (a sample is written there if it does not exist)
    #[arg(long, short, env = "REPAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Period length, overriding the file
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Safety bound on simulated periods, overriding the file
    #[arg(long)]
    max_periods: Option<usize>,

    /// Off-period rule for every-other-period nodes, overriding the file
    #[arg(long, value_enum)]
    cadence_policy: Option<CadencePolicyArg>,

    /// Start date (YYYY-MM-DD); falls back to the file, then today
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Write the per-period balance history as CSV
    #[arg(long)]
    history_csv: Option<PathBuf>,

    /// Print the run result as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Fail instead of writing a sample configuration when the file is missing
    #[arg(long)]
    no_bootstrap: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Monthly,
    SemiMonthly,
}

impl From<ModeArg> for PeriodMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Monthly => PeriodMode::Monthly,
            ModeArg::SemiMonthly => PeriodMode::SemiMonthly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CadencePolicyArg {
    SkipOffPeriods,
    RestrictExtraOnly,
}

impl From<CadencePolicyArg> for CadencePolicy {
    fn from(arg: CadencePolicyArg) -> Self {
        match arg {
            CadencePolicyArg::SkipOffPeriods => CadencePolicy::SkipOffPeriods,
            CadencePolicyArg::RestrictExtraOnly => CadencePolicy::RestrictExtraOnly,
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    if !args.no_bootstrap {
        ensure_default_config(&args.config).context("Failed to bootstrap configuration")?;
    }

    let mut file = load_config(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(mode) = args.mode {
        file.period_mode = mode.into();
    }
    if let Some(max_periods) = args.max_periods {
        file.max_periods = Some(max_periods);
    }
    if let Some(policy) = args.cadence_policy {
        file.cadence_policy = policy.into();
    }
    if let Some(start_date) = args.start_date {
        file.start_date = Some(start_date);
    }

    let config = file
        .into_simulation_config(Local::now().date_naive())
        .context("Invalid configuration")?;

    info!(
        capacity = config.capacity,
        nodes = config.node_configs.len(),
        mode = ?config.period_mode,
        "configuration loaded"
    );

    let mut orchestrator = Orchestrator::new(config)?;
    let result = orchestrator.run()?;

    if let Some(path) = &args.history_csv {
        history::write_history_csv(path, &result.history)?;
        info!(path = %path.display(), samples = result.history.len(), "history exported");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render_report(&result));
    }

    Ok(match result.outcome {
        RunOutcome::Completed => ExitCode::SUCCESS,
        RunOutcome::Aborted => ExitCode::from(EXIT_ABORTED),
    })
}

/// Logs go to stderr so `--json` output stays machine-readable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("repay_sim=info,repayment_simulator_core_rs=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
