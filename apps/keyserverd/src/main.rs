//! keyserverd - authoritative key server daemon
//!
//! Loads layered configuration, installs logging, and keeps the rotating
//! secrets of the cluster fresh until interrupted.

mod config;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use keyserver::{KeyServer, TokioTimer};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DaemonConfig;

#[derive(Debug, Parser)]
#[command(name = "keyserverd", version, about = "Rotating secret key server")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "KEYSERVER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start rotating secrets until interrupted
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Resume from replicated state instead of generating a first batch
    #[arg(long)]
    no_init: bool,

    /// Generate one batch, print the rotating secret fingerprints and exit
    #[arg(long, conflicts_with = "no_init")]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DaemonConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Run(args) => {
            keyserver_log::init(config.log.clone())?;
            run(config, args).await
        }
    }
}

async fn run(config: DaemonConfig, args: RunArgs) -> anyhow::Result<()> {
    let timer = TokioTimer::current()?;
    let server = KeyServer::builder()
        .config(config.keyserver)
        .timer(Arc::new(timer.clone()))
        .build()?;

    server
        .start(!args.no_init)
        .context("cannot serve without rotating secrets")?;

    if args.once {
        server.stop();
        print!("{}", server.describe_rotating());
        return Ok(());
    }

    tracing::info!(
        interval = ?server.config().rotation_interval,
        "Key server running, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!(version = server.rotating_version(), "Shutting down");
    server.stop();
    timer.shutdown();
    Ok(())
}
