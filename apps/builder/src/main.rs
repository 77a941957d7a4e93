mod config;
mod pipeline;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use pipeline::BuildMode;

#[derive(Parser)]
#[command(name = "fundlens", version, about = "Fund disclosure snapshot builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the consolidated snapshot artifact from all sources
    Build(BuildArgs),
    /// Print the persisted snapshot's row counts
    Status,
}

#[derive(Args)]
struct BuildArgs {
    /// Build mode
    #[arg(long, value_enum, default_value = "incremental")]
    mode: BuildMode,
    /// Trailing months of regulator archives to ingest
    #[arg(long, default_value_t = 12)]
    months: usize,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            let summary = pipeline::run_build(&config, args.mode, args.months).await?;
            tracing::info!(
                "Build finished: {} funds, {} consolidated rows ({} custody filings, {} regulator filings, {} on-demand)",
                summary.funds,
                summary.rows,
                summary.custody_filings,
                summary.regulator_filings,
                summary.on_demand_filings,
            );
        }
        Commands::Status => {
            pipeline::print_status(&config)?;
        }
    }
    Ok(())
}
