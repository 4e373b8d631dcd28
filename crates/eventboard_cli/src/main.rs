//! eventboard CLI.
//!
//! # Responsibility
//! - Drive the core listing service from the command line.
//! - Resolve configuration from the environment (and `.env`) before any
//!   storage access; a missing store address stops the process.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventboard_core::{
    default_log_level, init_logging, AppConfig, ConnectionManager, EventDraft, EventListQuery,
    ListingService, RepoError,
};
use log::error;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "eventboard",
    version,
    about = "Manage event listings and bookings in the eventboard store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, inspect and remove events
    #[command(subcommand)]
    Event(EventCommand),
    /// Create and list bookings
    #[command(subcommand)]
    Booking(BookingCommand),
    /// Print core health and version
    Ping,
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Create an event from a JSON document
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// List events ordered by date and time
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one event by slug
    Show { slug: String },
    /// Delete an event (its bookings are kept)
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum BookingCommand {
    /// Book a seat for an existing event
    Create { event_id: Uuid, email: String },
    /// List bookings of an event
    List { event_id: Uuid },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Ping = cli.command {
        println!("eventboard_core ping={}", eventboard_core::ping());
        println!("eventboard_core version={}", eventboard_core::core_version());
        return ExitCode::SUCCESS;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<RepoError>()
                .map_or("ERROR", RepoError::error_code);
            error!("event=cli_command module=cli status=error error_code={code}");
            eprintln!("error[{code}]: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    tolerate_missing_env_file(dotenvy::dotenv())?;
    let config = AppConfig::from_env()?;

    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, config.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let service = ListingService::new(Arc::new(ConnectionManager::sqlite(config.db_uri)));

    match command {
        Commands::Event(command) => run_event(&service, command),
        Commands::Booking(command) => run_booking(&service, command),
        Commands::Ping => Ok(()),
    }
}

/// A missing `.env` is fine since the variables may come from the shell; a
/// present but unreadable one is an error.
fn tolerate_missing_env_file<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to load .env file"),
    }
}

fn run_event(service: &ListingService, command: EventCommand) -> Result<()> {
    match command {
        EventCommand::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let draft: EventDraft = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON object", file.display()))?;
            print_json(&service.create_event(&draft)?)
        }
        EventCommand::List { tag, limit, offset } => {
            let query = EventListQuery { tag, limit, offset };
            print_json(&service.list_events(&query)?)
        }
        EventCommand::Show { slug } => match service.get_event_by_slug(&slug)? {
            Some(event) => print_json(&event),
            None => anyhow::bail!("no event with slug `{slug}`"),
        },
        EventCommand::Delete { id } => {
            service.delete_event(id)?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

fn run_booking(service: &ListingService, command: BookingCommand) -> Result<()> {
    match command {
        BookingCommand::Create { event_id, email } => {
            print_json(&service.create_booking(event_id, &email)?)
        }
        BookingCommand::List { event_id } => {
            print_json(&service.list_bookings_for_event(event_id)?)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
