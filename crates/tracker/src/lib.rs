//! Sleep tracker presentation layer.
//!
//! This crate sits between a screen and the [`storage`] crate. It turns user
//! actions (start, stop, rate, clear, select) into store writes and exposes
//! what the screen needs to draw itself.
//!
//! # Overview
//!
//! - **SleepTracker**: the state holder. It knows which night is being
//!   tracked, derives button visibility, renders the list of nights, and
//!   raises one-shot [`TrackerEvent`]s.
//! - **SessionListAdapter**: binds stored sessions to [`SessionRow`]s for a
//!   scrolling list.
//! - **format**: duration, quality, and report text.
//!
//! One-shot events sit in a queue until the screen acknowledges them, so a
//! screen that is rebuilt after handling an event does not handle it twice.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storage::SleepStore;
//! use tracker::{SleepTracker, TrackerEvent};
//!
//! # async fn example() -> tracker::Result<()> {
//! let store = Arc::new(SleepStore::in_memory()?);
//! let mut tracker = SleepTracker::new(store).await?;
//!
//! tracker.start_tracking().await?;
//! tracker.stop_tracking().await?;
//!
//! if let Some(TrackerEvent::RateSession(id)) = tracker.acknowledge_event() {
//!     tracker.rate(id, 4).await?;
//! }
//! println!("{}", tracker.nights_text(&chrono::Local));
//! # Ok(())
//! # }
//! ```

mod error;
mod events;
pub mod format;
mod rows;
mod tracker;

pub use error::{Error, Result};
pub use events::{EventQueue, TrackerEvent};
pub use rows::{QualityIcon, SessionListAdapter, SessionRow};
pub use tracker::{MAX_QUALITY, SleepTracker};
