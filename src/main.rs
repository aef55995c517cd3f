//! Page-Lens main entry point
//!
//! This is the command-line interface for the Page-Lens fetch-and-extract
//! pipeline. Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use page_lens::config::{load_config_with_hash, Config};
use page_lens::handler::{Handler, ScrapeEvent, ScrapeRequest};
use page_lens::storage::{
    open_store, ScrapeStore, SqliteStore, DEFAULT_HISTORY_LIMIT, DEFAULT_RECENT_DAYS,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Page-Lens: fetch one web page and report what is on it
///
/// Page-Lens fetches a page with browser-like headers, retrying transient
/// failures with tiered backoff, and reports transport metadata together
/// with the structured content of the page.
#[derive(Parser, Debug)]
#[command(name = "page-lens")]
#[command(version = "1.0.0")]
#[command(about = "Fetch a web page and report its transport and content signals", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and analyze a URL
    Fetch {
        /// The page to fetch
        url: String,

        /// Attempt budget (1-5); defaults to the configured value
        #[arg(short, long)]
        retries: Option<u32>,

        /// Owner of the persisted result
        #[arg(long)]
        user_id: Option<String>,

        /// Project id of the persisted result; generated when omitted
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Feed a gateway event (JSON file) to the handler and print the response
    Handle {
        #[arg(value_name = "EVENT")]
        event: PathBuf,
    },

    /// List stored results of a user, newest first
    History {
        #[arg(long)]
        user_id: String,

        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Only show results from the last N days
        #[arg(long, conflicts_with = "recent")]
        days: Option<u32>,

        /// Only show results from the last week
        #[arg(long)]
        recent: bool,
    },

    /// Show one stored result
    Show {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        project_id: String,
    },

    /// Delete one stored result
    Delete {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        project_id: String,
    },

    /// Show statistics from the database
    Stats,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch {
            url,
            retries,
            user_id,
            project_id,
        } => {
            let handler = Handler::from_config(&config).context("Failed to set up handler")?;
            let request = ScrapeRequest {
                url,
                retries,
                user_id,
                project_id,
            };
            let response = handler.handle_request(request).await;
            let body = response
                .body_json()
                .context("Handler returned a malformed body")?;
            print_json(&body)?;
            Ok(exit_code(response.is_success()))
        }
        Command::Handle { event } => {
            let raw = std::fs::read_to_string(&event)
                .with_context(|| format!("Failed to read event file {}", event.display()))?;
            let event: ScrapeEvent =
                serde_json::from_str(&raw).context("Event file is not a valid gateway event")?;

            let handler = Handler::from_config(&config).context("Failed to set up handler")?;
            let response = handler.handle(&event).await;
            print_json(&response)?;
            Ok(exit_code(response.is_success()))
        }
        Command::History {
            user_id,
            limit,
            days,
            recent,
        } => {
            let store = store(&config)?;
            let records = match days.or(recent.then_some(DEFAULT_RECENT_DAYS)) {
                Some(days) => {
                    let mut records = store.recent_records(&user_id, days)?;
                    records.truncate(limit);
                    records
                }
                None => store.records_for_user(&user_id, limit)?,
            };
            tracing::info!("Found {} record(s) for {}", records.len(), user_id);
            print_json(&records)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show {
            user_id,
            project_id,
        } => {
            let store = store(&config)?;
            match store.get_record(&user_id, &project_id)? {
                Some(record) => {
                    print_json(&record)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    tracing::error!("No record for {}/{}", user_id, project_id);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Delete {
            user_id,
            project_id,
        } => {
            let mut store = store(&config)?;
            let deleted = store.delete_record(&user_id, &project_id)?;
            print_json(&serde_json::json!({ "deleted": deleted }))?;
            Ok(exit_code(deleted))
        }
        Command::Stats => {
            let store = store(&config)?;
            print_json(&store.stats()?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_lens=info,warn"),
            1 => EnvFilter::new("page_lens=debug,info"),
            2 => EnvFilter::new("page_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn store(config: &Config) -> Result<SqliteStore> {
    if !config.storage.enabled {
        tracing::warn!("Persistence is disabled in the configuration; reading the database anyway");
    }
    let path = Path::new(&config.storage.database_path);
    open_store(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
