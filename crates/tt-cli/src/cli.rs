//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tt_remote::SyncDirection;

/// Time tracker.
///
/// Records work and absence intervals, runs a single timer, and reports hours
/// per description and day.
#[derive(Debug, Parser)]
#[command(name = "tt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the entry file (overrides configuration and discovery).
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the timer.
    Start {
        /// What you are working on.
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Stop the running timer and record the entry.
    Stop,

    /// Show the running timer and today's total.
    Status,

    /// List entries for a day.
    List {
        /// Day to list (YYYY-MM-DD, today, yesterday). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Record an entry manually.
    Add(AddArgs),

    /// Continue a recorded entry as the running timer.
    Resume {
        /// Day of the entry. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Entry number as shown by `tt list`. Defaults to the last entry.
        #[arg(long)]
        index: Option<usize>,
    },

    /// Change a recorded entry.
    Edit(EditArgs),

    /// Delete a recorded entry.
    Delete {
        /// Day of the entry. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Entry number as shown by `tt list`.
        #[arg(long)]
        index: usize,
    },

    /// Restore the most recently deleted entry.
    Undo,

    /// Hours per description and day.
    Report(ReportArgs),

    /// Push entries to or pull them from the web companion.
    Sync(SyncArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Start time (HH:MM, YYYY-MM-DD HH:MM, ISO 8601, "now" or "2 hours ago").
    #[arg(long)]
    pub start: String,

    /// End time, same formats as --start.
    #[arg(long)]
    pub end: String,

    /// Day used for time-only --start/--end. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Record an absence instead of work.
    #[arg(long)]
    pub absence: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Day of the entry. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// Entry number as shown by `tt list`.
    #[arg(long)]
    pub index: usize,

    /// New start time.
    #[arg(long)]
    pub start: Option<String>,

    /// New end time.
    #[arg(long)]
    pub end: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Mark the entry as an absence.
    #[arg(long, conflicts_with = "work")]
    pub absence: bool,

    /// Mark the entry as work.
    #[arg(long)]
    pub work: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// First day (YYYY-MM-DD). Defaults to the first day of this month.
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Also write the report as CSV to this path.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// push, pull or both (push then pull).
    #[arg(long, default_value = "both")]
    pub direction: SyncDirection,

    /// Server base URL (e.g. http://localhost:5000).
    #[arg(long)]
    pub server_url: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub pin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_add_with_absence() {
        let cli = Cli::try_parse_from([
            "tt", "add", "--start", "09:00", "--end", "12:00", "--absence", "-d", "Doctor",
        ])
        .unwrap();
        let Some(Commands::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert!(args.absence);
        assert_eq!(args.description, "Doctor");
    }

    #[test]
    fn test_parses_sync_direction() {
        let cli = Cli::try_parse_from(["tt", "sync", "--direction", "pull"]).unwrap();
        let Some(Commands::Sync(args)) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.direction, SyncDirection::Pull);

        assert!(Cli::try_parse_from(["tt", "sync", "--direction", "up"]).is_err());
    }

    #[test]
    fn test_edit_rejects_absence_and_work_together() {
        assert!(Cli::try_parse_from(["tt", "edit", "--index", "1", "--absence", "--work"]).is_err());
    }

    #[test]
    fn test_storage_flag_is_global() {
        let cli = Cli::try_parse_from(["tt", "status", "--storage", "/tmp/t.json"]).unwrap();
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/t.json")));
    }
}
