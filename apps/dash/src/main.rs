mod commands;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{ConfigArgs, DumpArgs, ListenArgs};

#[derive(Parser)]
#[command(name = "forza-delta", version)]
#[command(about = "Live lap delta, fuel and tire readout for Forza \"Data Out\" telemetry")]
struct Cli {
    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for telemetry and print the dashboard
    Listen(ListenArgs),
    /// Write every race-on packet to a TSV or CSV file
    Dump(DumpArgs),
    /// Write a dashboard config file with default values
    InitConfig(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Listen(args) => commands::listen(args).await,
        Commands::Dump(args) => commands::dump(args).await,
        Commands::InitConfig(args) => commands::init_config(args),
    }
}
