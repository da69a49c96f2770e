//! SQLite-backed storage for tracked sleep sessions.
//!
//! This crate owns the single table of sleep sessions: when tracking started,
//! when it ended, and how the night was rated. It is the only layer with
//! persistent state; everything above it reads and writes through
//! [`SleepStore`].
//!
//! # Core Concepts
//!
//! ## SleepStore
//!
//! The [`SleepStore`] wraps a SQLite connection and provides insert, update,
//! point lookup, clear, and an ordered listing of all sessions. Lookups of a
//! missing id return `None`; only failures of the database itself are errors.
//!
//! ## SleepSession
//!
//! A [`SleepSession`] is one tracked sleep attempt. A session is *open* while
//! its end time equals its start time, and *unrated* while its quality is
//! [`UNRATED`].
//!
//! ## SessionFeed
//!
//! [`SleepStore::list_all`] returns a [`SessionFeed`], a live view of the
//! listing. Each insert, effective update, or clear publishes the refreshed
//! listing (newest first) to every feed.
//!
//! # Example
//!
//! ```no_run
//! use storage::{SleepSession, SleepStore};
//!
//! # async fn example() -> storage::Result<()> {
//! let store = SleepStore::open("sleep.db")?;
//! let mut feed = store.list_all();
//!
//! // Start tracking a night
//! store.insert(&SleepSession::new(1_700_000_000_000))?;
//!
//! // Close it eight hours later
//! if let Some(mut night) = store.most_recent()? {
//!     night.end_time_millis = night.start_time_millis + 8 * 60 * 60 * 1000;
//!     store.update(&night)?;
//! }
//!
//! // Observe the refreshed listing
//! if let Some(nights) = feed.changed().await {
//!     println!("{} nights tracked", nights.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod session;
mod store;

pub use error::{Error, Result};
pub use session::{SessionId, SleepSession, UNRATED};
pub use store::{SessionFeed, SleepStore};
