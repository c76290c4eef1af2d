//! Presentation sinks
//!
//! A sink receives each normalized event exactly once. The binary uses
//! either [`NotificationSink`] or [`TextSink`]; [`ChannelSink`] forwards
//! owned reports to another task.

use crate::events::{Action, EntryKind, NormalizedEvent, Operation};
use crate::icon::Icon;
use filemon_core::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Receives normalized events
pub trait PresentationSink {
    /// Present one event
    fn present(&mut self, event: &NormalizedEvent<'_>) -> Result<()>;
}

/// Owned snapshot of a normalized event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: EntryKind,
    pub operation: Operation,
    pub title: String,
    pub description: String,
    pub target: PathBuf,
    pub icon: Option<Icon>,
}

impl Report {
    /// `"<title>: <description>"`
    pub fn line(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }

    pub fn action(&self) -> Action {
        self.operation.action()
    }
}

impl From<&NormalizedEvent<'_>> for Report {
    fn from(event: &NormalizedEvent<'_>) -> Self {
        Self {
            kind: event.kind,
            operation: event.operation,
            title: event.title(),
            description: event.description(),
            target: event.target.to_path_buf(),
            icon: event.icon.cloned(),
        }
    }
}

/// Writes one line per event to a stream
pub struct TextSink<W: Write> {
    out: W,
}

impl TextSink<std::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying stream
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for TextSink<W> {
    fn present(&mut self, event: &NormalizedEvent<'_>) -> Result<()> {
        writeln!(self.out, "{event}")
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::presentation(format!("Failed to write event: {e}")))
    }
}

/// Forwards owned reports over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Report>,
}

impl ChannelSink {
    /// Create a sink and the receiver its reports arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Report>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationSink for ChannelSink {
    fn present(&mut self, event: &NormalizedEvent<'_>) -> Result<()> {
        self.tx
            .send(Report::from(event))
            .map_err(|_| Error::presentation("Report receiver was dropped"))
    }
}

/// Action identifiers registered with the notification; the server reports
/// whichever one the user picked
const ACTION_IDS: [&str; 2] = ["default", "open"];

/// Desktop notifications through the freedesktop `notify-send` tool
///
/// Each notification carries one action. A task per notification waits for
/// the user's choice, launches the opener if the action was taken, and then
/// ends, releasing everything it captured.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    notify_send: PathBuf,
    opener: Option<PathBuf>,
    app_name: String,
}

impl NotificationSink {
    /// Locate the notification tool; fails when notifications are unavailable
    pub fn new(app_name: impl Into<String>) -> Result<Self> {
        let notify_send = which::which("notify-send").map_err(|e| {
            Error::presentation(format!("Error initializing notification daemon: {e}"))
        })?;

        let opener = match which::which("xdg-open") {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("xdg-open not found, notification actions will do nothing: {e}");
                None
            }
        };

        debug!("Using {:?} for notifications", notify_send);
        Ok(Self {
            notify_send,
            opener,
            app_name: app_name.into(),
        })
    }

    fn command(&self, report: &Report) -> Command {
        let label = report.action().label();
        let mut cmd = Command::new(&self.notify_send);
        cmd.arg(format!("--app-name={}", self.app_name));
        if let Some(icon) = &report.icon {
            cmd.arg(format!("--icon={}", icon.hint()));
        }
        for id in ACTION_IDS {
            cmd.arg(format!("--action={id}={label}"));
        }
        cmd.arg("--wait")
            .arg("--")
            .arg(&report.title)
            .arg(&report.description)
            .kill_on_drop(true);
        cmd
    }
}

impl PresentationSink for NotificationSink {
    fn present(&mut self, event: &NormalizedEvent<'_>) -> Result<()> {
        let report = Report::from(event);
        let mut cmd = self.command(&report);
        let opener = self.opener.clone();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::presentation(format!("No runtime for notifications: {e}")))?;

        runtime.spawn(async move {
            let output = match cmd.output().await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Failed to show notification '{}': {e}", report.title);
                    return;
                }
            };

            let chosen = String::from_utf8_lossy(&output.stdout);
            let chosen = chosen.trim();
            if !ACTION_IDS.contains(&chosen) {
                trace!("Notification '{}' closed without action", report.title);
                return;
            }

            let target = report.action().resolve(&report.target);
            match opener {
                Some(opener) => launch_opener(&opener, target).await,
                None => warn!("Cannot open {:?}: no opener available", target),
            }
        });

        Ok(())
    }
}

async fn launch_opener(opener: &Path, target: &Path) {
    debug!("Opening {:?}", target);
    match Command::new(opener).arg(target).status().await {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("{:?} exited with {status} opening {:?}", opener, target),
        Err(e) => warn!("Failed to launch {:?}: {e}", opener),
    }
}
