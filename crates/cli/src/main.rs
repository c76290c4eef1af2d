//! filemon - desktop notifications for file and directory changes
//!
//! This binary provides the command-line interface for the filemon system.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use filemon_core::config::{Config, OutputMode};
use filemon_watcher::{
    DesktopIconResolver, FileMonitor, NoIconResolver, NotificationSink, PresentationSink,
    TextSink,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filemon")]
#[command(about = "Desktop notifications for changes to files and directories")]
#[command(version)]
struct Cli {
    /// File or directory to monitor (repeatable)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Monitor file writes
    #[arg(short, long)]
    writes: bool,

    /// Monitor file movement
    #[arg(short, long)]
    movement: bool,

    /// Monitor file creation
    #[arg(short, long)]
    creation: bool,

    /// Monitor file deletion
    ///
    /// Entries created after startup are only tracked when creation is also
    /// monitored. Deleting an entry that was never tracked stops filemon with
    /// an error.
    #[arg(short, long)]
    deletion: bool,

    /// Print to stdout instead of using desktop notifications
    #[arg(short, long)]
    print: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer flags over the loaded configuration; a set flag only ever turns something on
    fn apply(&self, config: &mut Config) {
        config.watch.writes |= self.writes;
        config.watch.moves |= self.movement;
        config.watch.creation |= self.creation;
        config.watch.deletion |= self.deletion;
        if self.print {
            config.output.mode = OutputMode::Print;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "filemon={level},filemon_core={level},filemon_watcher={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;
    debug!("Effective configuration: {:?}", config);

    // Icons are only shown by notifications
    let (mut sink, mut monitor) = match config.output.mode {
        OutputMode::Notify => (
            Box::new(NotificationSink::new(&config.output.app_name)?) as Box<dyn PresentationSink>,
            FileMonitor::new(&config.watch, DesktopIconResolver::new())?,
        ),
        OutputMode::Print => (
            Box::new(TextSink::stdout()) as Box<dyn PresentationSink>,
            FileMonitor::new(&config.watch, NoIconResolver)?,
        ),
    };

    if cli.files.is_empty() {
        bail!("No files to monitor!");
    }
    if !config.watch.any_enabled() {
        warn!("No operations selected, nothing will be reported (use -w, -m, -c or -d)");
    }

    for path in &cli.files {
        if let Err(e) = monitor.add_target(path) {
            warn!("Skipping {:?}: {e}", path);
        }
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                interrupt.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
        }
    });

    let result = monitor.run(sink.as_mut(), cancel).await;
    monitor.stop();
    result?;

    Ok(())
}
