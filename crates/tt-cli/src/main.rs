use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tt_cli::commands::entries::{EntryChanges, NewEntry};
use tt_cli::commands::report::ReportRequest;
use tt_cli::commands::{entries, report, status, sync, timer, util};
use tt_cli::tracker::{self, Store};
use tt_cli::{Cli, Commands, Config};

/// Load config and open the entry store.
fn open_store(cli: &Cli) -> Result<(Store, Config, PathBuf)> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let path = config.resolve_storage_path(cli.storage.as_deref());
    tracing::debug!(path = %path.display(), "using entry file");

    let store = tracker::open(&path, config.accounting, &mut io::stderr())?;
    Ok((store, config, path))
}

#[allow(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut store, config, path) = open_store(&cli)?;
    let now = util::now();
    let today = now.date();
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Start { description } => {
            timer::start(&mut stdout, &mut store, description, now)?;
            tracker::save_session(&store)?;
        }
        Commands::Stop => {
            timer::stop(&mut stdout, &mut store, now)?;
            tracker::save_session(&store)?;
        }
        Commands::Resume { date, index } => {
            let date = util::date_or_today(date.as_deref(), today)?;
            timer::resume(&mut stdout, &mut store, date, *index)?;
            tracker::save_session(&store)?;
        }
        Commands::Status => {
            status::run(&mut stdout, &store, &path, now)?;
        }
        Commands::List { date } => {
            let date = util::date_or_today(date.as_deref(), today)?;
            entries::list(&mut stdout, &store, date)?;
        }
        Commands::Add(args) => {
            let date = util::date_or_today(args.date.as_deref(), today)?;
            let entry = NewEntry {
                start: &args.start,
                end: &args.end,
                description: &args.description,
                is_absence: args.absence,
            };
            entries::add(&mut stdout, &mut store, &entry, date, now)?;
        }
        Commands::Edit(args) => {
            let date = util::date_or_today(args.date.as_deref(), today)?;
            let is_absence = if args.absence {
                Some(true)
            } else if args.work {
                Some(false)
            } else {
                None
            };
            let changes = EntryChanges {
                start: args.start.as_deref(),
                end: args.end.as_deref(),
                description: args.description.as_deref(),
                is_absence,
            };
            entries::edit(&mut stdout, &mut store, date, args.index, &changes, now)?;
        }
        Commands::Delete { date, index } => {
            let date = util::date_or_today(date.as_deref(), today)?;
            entries::delete(&mut stdout, &mut store, date, *index)?;
            tracker::save_session(&store)?;
        }
        Commands::Undo => {
            entries::undo(&mut stdout, &mut store)?;
            tracker::save_session(&store)?;
        }
        Commands::Report(args) => {
            let (default_start, default_end) = report::default_range(today);
            let start = args
                .start_date
                .as_deref()
                .map_or(Ok(default_start), |s| util::parse_date(s, today))?;
            let end = args
                .end_date
                .as_deref()
                .map_or(Ok(default_end), |s| util::parse_date(s, today))?;
            let request = ReportRequest {
                start,
                end,
                csv: args.csv.as_deref(),
                json: args.json,
            };
            report::run(&mut stdout, &store, &request)?;
        }
        Commands::Sync(args) => {
            let credentials = sync::Credentials::resolve(args, &config)?;
            sync::run(&mut stdout, &mut store, &credentials, args.direction)?;
        }
    }

    stdout.flush()?;
    Ok(())
}
