mod config;
mod error;
mod logging;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use storage::{SessionId, SleepSession, SleepStore};
use tracing::debug;
use tracker::format::{format_duration, quality_label};
use tracker::{SessionListAdapter, SleepTracker, TrackerEvent};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "sleeptrack.toml";

#[derive(Parser)]
#[command(name = "sleeptrack")]
#[command(about = "Track how long and how well you sleep", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (overrides sleeptrack.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive tracker
    Track,
    /// Start tracking a night
    Start,
    /// Stop tracking the current night
    Stop,
    /// Rate a night from 0 (very bad) to 5 (excellent)
    Rate {
        quality: i32,
        /// Session ID (defaults to the most recent stopped night)
        #[arg(short, long)]
        session: Option<i64>,
    },
    /// List tracked nights, newest first
    List {
        /// Show only the last N nights
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one night
    Show { id: i64 },
    /// Show whether a night is being tracked
    Status,
    /// Delete all tracked nights
    Clear,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config()?;
    logging::init(&config.logging.filter);

    let db_path = cli.db.unwrap_or_else(|| config.database_path());
    let store = open_store(&db_path)?;
    let mut tracker = SleepTracker::new(Arc::new(store)).await?;

    match cli.command {
        Some(Commands::Track) | None => return cmd_track(&mut tracker, &db_path).await,
        Some(Commands::Start) => cmd_start(&mut tracker).await?,
        Some(Commands::Stop) => cmd_stop(&mut tracker).await?,
        Some(Commands::Rate { quality, session }) => {
            cmd_rate(&mut tracker, quality, session.map(SessionId)).await?
        }
        Some(Commands::List { limit, json }) => cmd_list(&tracker, limit, json)?,
        Some(Commands::Show { id }) => tracker.select(SessionId(id)),
        Some(Commands::Status) => print_status(&tracker),
        Some(Commands::Clear) => tracker.clear().await?,
    }

    handle_events(&mut tracker).await
}

async fn cmd_track(tracker: &mut SleepTracker, db_path: &Path) -> Result<()> {
    println!("sleeptrack v{}", env!("CARGO_PKG_VERSION"));
    println!("Nights stored at: {}", db_path.display());
    println!("Type 'help' for commands, 'quit' or Ctrl+D to exit.\n");
    print_status(tracker);

    let mut adapter = SessionListAdapter::new();
    adapter.set_data(tracker.nights());
    let mut drawn_revision = adapter.revision();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let outcome = match (command, args.as_slice()) {
            ("quit" | "exit", _) => break,
            ("help", _) => {
                print_help();
                Ok(())
            }
            ("start", []) => cmd_start(tracker).await,
            ("stop", []) => cmd_stop(tracker).await,
            ("rate", [quality]) => match quality.parse() {
                Ok(quality) => cmd_rate(tracker, quality, None).await,
                Err(_) => {
                    println!("Quality must be a number from 0 to 5.");
                    Ok(())
                }
            },
            ("rate", [quality, id]) => match (quality.parse(), id.parse()) {
                (Ok(quality), Ok(id)) => cmd_rate(tracker, quality, Some(SessionId(id))).await,
                _ => {
                    println!("Usage: rate <0-5> [session id]");
                    Ok(())
                }
            },
            ("list", []) => {
                print_rows(&adapter);
                drawn_revision = adapter.revision();
                Ok(())
            }
            ("report", []) => {
                println!("{}", tracker.nights_text(&Local));
                Ok(())
            }
            ("open", [id]) => match id.parse() {
                Ok(id) => {
                    tracker.select(SessionId(id));
                    Ok(())
                }
                Err(_) => {
                    println!("Usage: open <session id>");
                    Ok(())
                }
            },
            ("status", []) => {
                print_status(tracker);
                Ok(())
            }
            ("clear", []) => tracker.clear().await.map_err(Error::from),
            _ => {
                println!("Unknown command '{}'. Type 'help' for commands.", line.trim());
                Ok(())
            }
        };

        let outcome = match outcome {
            Ok(()) => handle_events(tracker).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            eprintln!("Error: {e}\n");
            continue;
        }

        if tracker.nights_changed() {
            if let Some(nights) = tracker.next_change().await {
                adapter.set_data(nights);
            }
        }
        // Redraw the list whenever the store published a new listing
        if adapter.revision() != drawn_revision {
            println!();
            print_rows(&adapter);
            println!();
            drawn_revision = adapter.revision();
        }
    }

    println!("\nGood night.");
    Ok(())
}

async fn cmd_start(tracker: &mut SleepTracker) -> Result<()> {
    if let Some(night) = tracker.tonight() {
        println!(
            "Already tracking since {}.",
            format_time(night.start_time_millis)
        );
        return Ok(());
    }

    if let Some(night) = tracker.start_tracking().await? {
        println!(
            "Tracking night {} since {}.",
            night.id,
            format_time(night.start_time_millis)
        );
    }
    Ok(())
}

async fn cmd_stop(tracker: &mut SleepTracker) -> Result<()> {
    match tracker.stop_tracking().await? {
        Some(night) => println!(
            "Stopped tracking night {}: {}.",
            night.id,
            format_duration(night.start_time_millis, night.end_time_millis, &Local)
        ),
        None => println!("Not tracking. Run 'start' first."),
    }
    Ok(())
}

async fn cmd_rate(tracker: &mut SleepTracker, quality: i32, id: Option<SessionId>) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => tracker.last_finished().await?.ok_or(Error::NothingToRate)?.id,
    };

    match tracker.rate(id, quality).await? {
        Some(night) => {
            println!(
                "Rated night {}: {}.",
                night.id,
                quality_label(night.sleep_quality)
            );
            Ok(())
        }
        None => Err(Error::SessionNotFound { id }),
    }
}

fn cmd_list(tracker: &SleepTracker, limit: usize, json: bool) -> Result<()> {
    let nights: Vec<SleepSession> = tracker.nights().into_iter().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&nights)?);
        return Ok(());
    }

    let mut adapter = SessionListAdapter::new();
    adapter.set_data(nights);
    print_rows(&adapter);
    Ok(())
}

fn print_rows(adapter: &SessionListAdapter) {
    if adapter.item_count() == 0 {
        println!("No nights tracked yet.");
        return;
    }

    println!("{:<6}  {:<28}  {:<6}  QUALITY", "ID", "SLEPT", "");
    println!("{}", "-".repeat(60));

    for row in adapter.rows(&Local) {
        println!(
            "{:<6}  {:<28}  {:<6}  {}",
            row.id.0,
            row.duration,
            row.icon.glyph(),
            row.quality
        );
    }
}

/// Act on every pending tracker event, acknowledging each once handled.
async fn handle_events(tracker: &mut SleepTracker) -> Result<()> {
    while let Some(event) = tracker.pending_event().cloned() {
        match &event {
            TrackerEvent::RateSession(id) => {
                println!("How did you sleep? Rate it with 'rate <0-5> {id}'.");
            }
            TrackerEvent::ReturnToTracker => print_status(tracker),
            TrackerEvent::OpenSession(id) => {
                let id = *id;
                tracker.acknowledge_event();
                let night = tracker
                    .session(id)
                    .await?
                    .ok_or(Error::SessionNotFound { id })?;
                print_session(&night);
                continue;
            }
            TrackerEvent::Snackbar(message) => println!("{message}"),
        }
        tracker.acknowledge_event();
    }
    Ok(())
}

fn print_status(tracker: &SleepTracker) {
    match tracker.tonight() {
        Some(night) => println!(
            "Tracking since {} ({}).",
            format_time(night.start_time_millis),
            format_duration(
                night.start_time_millis,
                Utc::now().timestamp_millis(),
                &Local
            )
        ),
        None => println!("Not tracking."),
    }
    println!("{} night(s) tracked.", tracker.nights().len());

    let actions: Vec<&str> = [
        (tracker.start_visible(), "start"),
        (tracker.stop_visible(), "stop"),
        (tracker.clear_visible(), "clear"),
    ]
    .into_iter()
    .filter_map(|(visible, action)| visible.then_some(action))
    .collect();
    println!("Available: {}", actions.join(", "));
}

fn print_session(night: &SleepSession) {
    println!("Night {}", night.id);
    println!("  Started:  {}", format_time(night.start_time_millis));
    if night.is_open() {
        println!("  Ended:    (still tracking)");
    } else {
        println!("  Ended:    {}", format_time(night.end_time_millis));
        println!(
            "  Slept:    {}",
            format_duration(night.start_time_millis, night.end_time_millis, &Local)
        );
    }
    println!("  Quality:  {}", quality_label(night.sleep_quality));
}

fn print_help() {
    println!("Commands:");
    println!("  start                 start tracking a night");
    println!("  stop                  stop tracking and rate the night");
    println!("  rate <0-5> [id]       rate a night (defaults to the last stopped)");
    println!("  list                  list all nights");
    println!("  report                show the full sleep report");
    println!("  open <id>             show one night");
    println!("  status                show what is being tracked");
    println!("  clear                 delete all nights");
    println!("  quit                  leave the tracker");
}

fn format_time(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

fn open_store(db_path: &Path) -> Result<SleepStore> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %db_path.display(), "opening sleep store");
    Ok(SleepStore::open(db_path)?)
}

fn load_config() -> Result<Config> {
    let config_path = PathBuf::from(CONFIG_FILE);

    if config_path.exists() {
        Ok(Config::load(&config_path)?)
    } else {
        Ok(Config::default())
    }
}
