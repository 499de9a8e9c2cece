use std::path::PathBuf;
use std::process;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod api_client;
mod commands;
mod config;
mod directory;
mod dock;
mod error;
mod logging;
mod planner;
mod render;
mod storage;
mod timeline;
mod tui;

use timeline::Resolution;

const HELP_TEXT: &str = r#"
  Examples
    $ sp
    $ sp layout --from 2026-03-01 --days 30 --resolution week
    $ sp add --group Rigging --title "Truss load-in" --start 2026-03-14T08:00 --end 2026-03-14T12:00
    $ sp --data-dir ~/shows/spring layout
"#;

#[derive(Parser)]
#[command(
    name = "sp",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive crew & equipment timeline for the terminal",
    after_help = HELP_TEXT
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Define a custom data directory
    #[arg(long = "data-dir", value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the packed timeline for a range
    Layout {
        /// First instant shown (defaults to the start of the current unit)
        #[arg(long, value_parser = commands::parse_instant)]
        from: Option<DateTime<Utc>>,

        /// Number of days shown
        #[arg(long)]
        days: Option<u32>,

        /// hour, day, week or month
        #[arg(long, value_parser = commands::parse_resolution)]
        resolution: Option<Resolution>,
    },

    /// Schedule a new item
    Add {
        /// Row group (crew, stage, truck, ...)
        #[arg(long, default_value = "")]
        group: String,

        #[arg(long)]
        title: String,

        #[arg(long, value_parser = commands::parse_instant)]
        start: DateTime<Utc>,

        #[arg(long, value_parser = commands::parse_instant)]
        end: DateTime<Utc>,
    },
}

fn main() {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    init_logging(data_dir);

    let result = match cli.command {
        None => tui::run(data_dir),
        Some(Command::Layout {
            from,
            days,
            resolution,
        }) => commands::layout(data_dir, from, days, resolution),
        Some(Command::Add {
            group,
            title,
            start,
            end,
        }) => commands::add(data_dir, group, title, start, end),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Logging problems never stop the program; they are reported once.
fn init_logging(cli_data_dir: Option<&std::path::Path>) {
    let config = config::Config::load_or_default();
    let resolved = directory::resolve_data_directory(cli_data_dir, &config)
        .and_then(|dir| logging::init(&dir, &config.log_level));
    if let Err(e) = resolved {
        eprintln!("Warning: logging disabled: {e}");
    }
}
