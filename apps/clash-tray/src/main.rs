//! Clash Tray: system tray front-end for the clash/mihomo proxy daemon.
//!
//! Starts, stops and watches the daemon, opens its web dashboard and config
//! directory, and reports state changes as desktop notifications.

// Hide console window on Windows release builds
#![cfg_attr(all(target_os = "windows", not(debug_assertions)), windows_subsystem = "windows")]

mod app;
mod config;
mod controller;
mod desktop;
mod icons;
mod logging;
mod view;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(about, author, name = env!("CARGO_BIN_NAME"), version)]
struct Args {
    /// Configuration file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging, including daemon output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = logging::init(args.verbose)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "starting clash-tray"
    );

    let config = config::Config::load(args.config.as_deref())?;
    app::run(config)
}
