#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! File identity tracking and event normalization
//!
//! This crate turns low-level filesystem change events into one
//! user-meaningful report per change:
//! - A registry of observed entries keyed by canonical path
//! - Pairing of move halves into renames and moves
//! - Coalescing of write bursts
//! - Operation filtering and display formatting
//! - Desktop notification and plain text presentation
//!
//! # Example
//!
//! ```no_run
//! use filemon_core::WatchConfig;
//! use filemon_watcher::{DesktopIconResolver, FileMonitor, TextSink};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WatchConfig {
//!     creation: true,
//!     deletion: true,
//!     ..WatchConfig::default()
//! };
//! let mut monitor = FileMonitor::new(&config, DesktopIconResolver::new())?;
//! monitor.add_target(Path::new("/path/to/inbox"))?;
//!
//! let mut sink = TextSink::stdout();
//! monitor.run(&mut sink, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

mod coalesce;
mod events;
mod icon;
mod ignore;
mod monitor;
mod normalizer;
mod pairing;
mod paths;
mod registry;
mod sink;
mod source;

// Public exports
pub use coalesce::ChangeCoalescer;
pub use events::{Action, EntryKind, NormalizedEvent, Operation, RawEvent, RawEventKind};
pub use icon::{DesktopIconResolver, Icon, IconResolver, NoIconResolver};
pub use ignore::IgnoreFilter;
pub use monitor::FileMonitor;
pub use normalizer::{EventNormalizer, InterestFilter};
pub use pairing::MovePairer;
pub use paths::{base_name, identity, PathDisplay};
pub use registry::{Registry, TrackedEntry};
pub use sink::{ChannelSink, NotificationSink, PresentationSink, Report, TextSink};
pub use source::WatchSource;

