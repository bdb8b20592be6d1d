#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::path::PathBuf;

use clap::Parser;
use missive::{Config, Missive};

/// Contact-form to SMTP relay
#[derive(Debug, Parser)]
#[command(name = "missive", version, about)]
struct Args {
    /// Configuration file (RON). Without it, `./missive.config.ron` and
    /// `/etc/missive/missive.config.ron` are tried, then built-in defaults.
    #[arg(short, long, env = "MISSIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Verify the relay connection and credentials, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let missive = Missive::new(config)?;

    if args.check {
        return missive.check().await;
    }

    missive.run().await
}
