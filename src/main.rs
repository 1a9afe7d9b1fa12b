//! macwatch - passive LAN device monitor
//!
//! Watches network interfaces and prints a live table of every MAC address
//! seen, with its last IP, packet count and vendor.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use macwatch::capture::describe_interfaces;
use macwatch::reporter::ConsoleRenderer;
use macwatch::{Config, Monitor, Overrides, VendorRegistry};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "macwatch")]
#[command(about = "Passive LAN device monitor with OUI vendor lookup")]
#[command(version)]
struct Cli {
    /// Interface to capture on (repeatable); overrides --mode
    #[arg(short, long = "interface", value_name = "NAME")]
    interfaces: Vec<String>,

    /// Interface selection: all, first or catch-all
    #[arg(short, long)]
    mode: Option<String>,

    /// Path to an IEEE oui.txt file
    #[arg(long = "oui", value_name = "PATH")]
    oui_path: Option<PathBuf>,

    /// Capture read timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    read_timeout_ms: Option<u64>,

    /// Report refresh interval in milliseconds
    #[arg(long = "interval-ms", value_name = "MS")]
    report_interval_ms: Option<u64>,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[arg(short, long = "duration", value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Hide devices with neither a known IP nor a known vendor
    #[arg(long)]
    hide_unresolved: bool,

    /// Do not clear the screen between reports
    #[arg(long)]
    no_clear: bool,

    /// Show full addresses, byte counts and interfaces
    #[arg(long)]
    wide: bool,

    /// Read settings from a key = value file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List available network interfaces and exit
    #[arg(short, long)]
    list_interfaces: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            interfaces: self.interfaces.clone(),
            mode: self.mode.clone(),
            oui_path: self.oui_path.clone(),
            read_timeout_ms: self.read_timeout_ms,
            report_interval_ms: self.report_interval_ms,
            duration_secs: self.duration_secs,
            hide_unresolved: self.hide_unresolved,
            no_clear: self.no_clear,
        }
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the table on stdout
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_interfaces {
        println!("Available network interfaces:");
        for iface in describe_interfaces() {
            println!("  {}", iface);
        }
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;
    info!("Configuration: {:?}", config);

    // Built once, before any capture thread starts; read-only afterwards
    let registry = VendorRegistry::load(&config.oui_path);

    let renderer = ConsoleRenderer::new()
        .with_clear_screen(config.clear_screen)
        .with_verbose(cli.wide);

    let monitor = Monitor::new(config, registry);

    let running = monitor.running_flag();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let summary = monitor.run(renderer)?;

    if summary.workers > 0 && summary.failed_opens == summary.workers {
        eprintln!(
            "warning: no interface could be opened ({} tried); run with -v for details",
            summary.workers
        );
    }

    Ok(())
}
