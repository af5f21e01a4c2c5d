//! updatebot CLI

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Propagate version bumps to downstream repositories as pull requests
#[derive(Parser)]
#[command(name = "updatebot", version, about)]
struct Cli {
    /// Log filter (e.g. `debug`, `updatebot=trace`); defaults to `RUST_LOG` or `info`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a pull request on each downstream repository
    Pr(cli::pr::PrArgs),
}

fn init_tracing(level: Option<&str>) {
    let filter = level.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        EnvFilter::new,
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Pr(args) => {
            cli::pr::run_pr(args).await?;
        }
    }
    Ok(())
}
