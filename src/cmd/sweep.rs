use crate::reports;
use clap::Args;
use loopforge::config::Config;
use loopforge::error::LfResult;
use loopforge::grids::KnownGrid;
use loopforge::sweep::{self, CombinationOutcome, ProgressCallback, Status, SweepOptions};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Named grid to expand (see `grids`).
    #[arg(short, long)]
    pub grid: KnownGrid,

    /// Parameters not swept by the grid.
    #[command(flatten)]
    pub config: Config,

    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long, env = "SLURM_PROCID", default_value_t = 0)]
    pub task_id: usize,

    #[arg(long, env = "SLURM_NTASKS", default_value_t = 1)]
    pub num_tasks: usize,

    #[arg(short, long, default_value = "outputs")]
    pub output_dir: PathBuf,
}

/// Logs a line every `every` combinations.
struct LogProgress {
    every: usize,
}

impl ProgressCallback for LogProgress {
    fn on_progress(&self, done: usize, total: usize, outcome: &CombinationOutcome) -> bool {
        if outcome.status == Status::Failed {
            warn!("⚠️  [{}/{}] {} failed", done, total, outcome.title);
        } else if done % self.every == 0 || done == total {
            info!("📈 [{}/{}] {}", done, total, outcome.title);
        }
        true
    }
}

pub fn run(args: SweepArgs) -> LfResult<()> {
    let base = super::resolve_config(&args.config, &args.config_file)?;
    let configs = args.grid.expand(&base);

    let defaults = SweepOptions::default();
    let options = SweepOptions {
        workers: args.workers.unwrap_or(defaults.workers),
        task_id: args.task_id,
        num_tasks: args.num_tasks,
        output_dir: args.output_dir,
    };
    info!(
        "🗂️  Grid '{}' expands to {} combinations ({} workers)",
        args.grid,
        configs.len(),
        options.workers
    );

    let every = (configs.len() / options.num_tasks.max(1) / 20).max(1);
    let report = sweep::run_sweep(args.grid.path(), &configs, &options, LogProgress { every })?;
    reports::print_sweep_report(&report);
    Ok(())
}
