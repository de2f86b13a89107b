pub mod grids;
pub mod run;
pub mod sweep;

use loopforge::config::Config;
use loopforge::error::LfResult;
use std::path::PathBuf;
use tracing::info;

/// A JSON file, when given, replaces the parameters set by flags.
pub fn resolve_config(flags: &Config, file: &Option<PathBuf>) -> LfResult<Config> {
    match file {
        Some(path) => {
            info!("📂 Loading configuration from {}", path.display());
            Config::load_from_file(path)
        }
        None => Ok(flags.clone()),
    }
}
