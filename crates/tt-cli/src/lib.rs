//! Time tracker CLI library.
//!
//! This crate provides the CLI interface for the time tracker.

mod cli;
pub mod commands;
mod config;
pub mod tracker;

pub use cli::{AddArgs, Cli, Commands, EditArgs, ReportArgs, SyncArgs};
pub use config::Config;
