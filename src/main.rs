use clap::{Parser, Subcommand};
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate and analyse a single parameter combination.
    Run(cmd::run::RunArgs),
    /// Run this task's share of a named parameter grid.
    Sweep(cmd::sweep::SweepArgs),
    /// List the named parameter grids.
    Grids,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let outcome = match cli.command {
        Commands::Run(args) => cmd::run::run(args),
        Commands::Sweep(args) => cmd::sweep::run(args),
        Commands::Grids => {
            cmd::grids::run();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        tracing::error!("❌ {}", e);
        process::exit(1);
    }
}
