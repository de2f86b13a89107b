use crate::reports;
use clap::Args;
use loopforge::api;
use loopforge::config::Config;
use loopforge::error::LfResult;
use loopforge::output::write_record;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: Config,

    /// JSON parameter file; replaces the parameter flags when given.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[arg(short, long, default_value = "outputs")]
    pub output_dir: PathBuf,
}

pub fn run(args: RunArgs) -> LfResult<()> {
    let config = super::resolve_config(&args.config, &args.config_file)?;
    let title = api::run_title(&config);
    info!("🧬 Running {}", title);

    let start = Instant::now();
    let record = api::run_combination(&config)?;
    let path = write_record(&args.output_dir.join(&title), &record)?;

    reports::print_run_report(&title, &record, start.elapsed().as_secs_f64());
    info!("💾 Saved to {}", path.display());
    Ok(())
}
