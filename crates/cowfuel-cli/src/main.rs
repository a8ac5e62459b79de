mod commands;

use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cowfuel-cli")]
#[command(about = "COW fuel plan command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the sheet once and write `fuel_today.csv` and `fuel_pending.csv`.
    Report {
        /// Directory the report files are written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Fetch the sheet once and print the summary counts as JSON.
    Summary,
    /// Run the pipeline over a local CSV export and print the counts.
    Parse {
        #[arg(long)]
        file: PathBuf,
        /// Fixed offset such as `+03:00`; falls back to `COWFUEL_UTC_OFFSET`,
        /// then the host zone.
        #[arg(long, env = "COWFUEL_UTC_OFFSET", value_parser = parse_offset_arg)]
        utc_offset: Option<FixedOffset>,
    },
}

fn parse_offset_arg(raw: &str) -> Result<FixedOffset, String> {
    cowfuel_core::parse_utc_offset(raw)
        .ok_or_else(|| format!("expected Z, UTC or +HH[:MM], got {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Report { out_dir } => {
            let config = cowfuel_core::load_app_config_from_env()?;
            commands::run_report(&config, &out_dir).await?;
        }
        Commands::Summary => {
            let config = cowfuel_core::load_app_config_from_env()?;
            commands::run_summary(&config).await?;
        }
        Commands::Parse { file, utc_offset } => commands::run_parse(&file, utc_offset)?,
    }

    Ok(())
}
