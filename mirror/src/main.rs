//! Keygate mirror service.
//!
//! Receives per-owner license subsets pushed by the issuing process and
//! serves them for external lookup.
//!
//! Usage:
//!   keygate-mirror --secret <shared secret> [--port 8080] [--data-dir mirror-data]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use keygate_mirror::{build_router, MirrorDir, MirrorState};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keygate-mirror")]
#[command(about = "Keygate license mirror service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Directory holding per-owner mirror files
    #[arg(short, long, default_value = "mirror-data")]
    data_dir: PathBuf,

    /// Shared secret required for uploads and privileged reads
    #[arg(short, long)]
    secret: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Keygate mirror starting...");
    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("failed to create data dir {}", args.data_dir.display()))?;

    let state = Arc::new(MirrorState {
        upload_secret: args.secret,
        files: MirrorDir::new(&args.data_dir),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .context("failed to bind HTTP port")?;
    info!("Mirror listening on port {} (data dir {})", args.port, args.data_dir.display());
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
