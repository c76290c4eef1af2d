#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Core types shared across the filemon workspace
//!
//! This crate provides:
//!
//! - **Configuration**: layered settings (defaults, TOML file, environment)
//! - **Error handling**: unified error type and `Result` alias
//!

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, OutputConfig, OutputMode, WatchConfig};
pub use error::{Error, Result};

