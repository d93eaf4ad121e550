//! morphex - face-morph preference experiment runner
//!
//! Walks one participant through gender selection, photo upload, the
//! writing task, the pre-questionnaire and the 36-trial rating block,
//! autosaving to the collector as it goes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use morphex_sync::HttpCollector;
use morphex_timing::MonotonicTimer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod console;

use app::{App, Input};
use config::{AppConfig, Overrides};

/// Command-line arguments for morphex
#[derive(Parser, Debug)]
#[command(name = "morphex")]
#[command(about = "Face-morph preference experiment runner")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "MORPHEX_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the morph service and data collector
    #[arg(long, env = "MORPHEX_COLLECTOR_URL")]
    collector_url: Option<String>,

    /// Directory for local exports
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Length of the writing-task countdown in seconds
    #[arg(long)]
    countdown_secs: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    // logs go to stderr, the participant console owns stdout
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = AppConfig::load(args.config.as_deref())?.apply(Overrides {
        collector_url: args.collector_url,
        export_dir: args.export_dir,
        countdown_secs: args.countdown_secs,
    });
    info!(
        collector = %config.sync.collector_url,
        export_dir = %config.sync.export_dir.display(),
        "starting morphex"
    );

    let collector = Arc::new(
        HttpCollector::new(&config.sync).context("Failed to build collector client")?,
    );
    let mut app = App::new(config, collector, MonotonicTimer::new(), &mut rand::rng());

    let tx = app.sender();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(Input::Line(line)).is_err() {
                        break;
                    }
                }
                Ok(None) | Err(_) => {
                    let _ = tx.send(Input::Eof);
                    break;
                }
            }
        }
    });

    app.run().await
}
