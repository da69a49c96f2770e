//! Presentation state for the sleep tracker screen.

use crate::events::{EventQueue, TrackerEvent};
use crate::format::format_nights;
use crate::{Error, Result};
use chrono::{TimeZone, Utc};
use std::fmt::Display;
use std::sync::Arc;
use storage::{SessionFeed, SessionId, SleepSession, SleepStore};
use tracing::info;

/// Highest value on the rating scale.
pub const MAX_QUALITY: i32 = 5;

const CLEARED_MESSAGE: &str = "All your sleep data is gone forever.";

/// State behind the tracker screen.
///
/// Actions take `&mut self`, so a single tracker is a sequential queue of
/// writes against the store. Store calls run on the blocking pool.
pub struct SleepTracker {
    store: Arc<SleepStore>,
    tonight: Option<SleepSession>,
    nights: SessionFeed,
    events: EventQueue<TrackerEvent>,
}

impl SleepTracker {
    /// Create a tracker, picking up a session that is still being tracked.
    pub async fn new(store: Arc<SleepStore>) -> Result<Self> {
        let nights = store.list_all();
        let mut tracker = Self {
            store,
            tonight: None,
            nights,
            events: EventQueue::default(),
        };
        tracker.tonight = tracker.load_tonight().await?;
        Ok(tracker)
    }

    /// Start tracking a new night.
    ///
    /// If a night is already being tracked it is returned unchanged.
    pub async fn start_tracking(&mut self) -> Result<Option<SleepSession>> {
        if self.tonight.is_some() {
            return Ok(self.tonight);
        }

        let night = SleepSession::new(now_millis());
        self.with_store(move |store| store.insert(&night)).await?;
        self.tonight = self.load_tonight().await?;

        if let Some(night) = &self.tonight {
            info!(id = %night.id, "started tracking");
        }
        Ok(self.tonight)
    }

    /// Stop tracking tonight and ask for a rating.
    ///
    /// Does nothing when no night is being tracked.
    pub async fn stop_tracking(&mut self) -> Result<Option<SleepSession>> {
        let Some(mut night) = self.tonight else {
            return Ok(None);
        };

        // Ending in the same millisecond would leave the session open.
        night.end_time_millis = now_millis().max(night.start_time_millis + 1);
        self.with_store(move |store| store.update(&night)).await?;
        self.tonight = None;

        info!(id = %night.id, duration_millis = night.duration_millis(), "stopped tracking");
        self.events.push(TrackerEvent::RateSession(night.id));
        Ok(Some(night))
    }

    /// Save a quality rating for a finished session.
    ///
    /// Returns `None` without raising an event when the session is unknown.
    /// A session that is still being tracked cannot be rated.
    pub async fn rate(&mut self, id: SessionId, quality: i32) -> Result<Option<SleepSession>> {
        if !(0..=MAX_QUALITY).contains(&quality) {
            return Err(Error::InvalidQuality(quality));
        }

        let Some(mut night) = self.session(id).await? else {
            return Ok(None);
        };
        if night.is_open() {
            return Err(Error::SessionOpen(id));
        }
        night.sleep_quality = quality;
        self.with_store(move |store| store.update(&night)).await?;

        info!(id = %id, quality, "rated night");
        self.events.push(TrackerEvent::ReturnToTracker);
        Ok(Some(night))
    }

    /// Delete every tracked night.
    pub async fn clear(&mut self) -> Result<()> {
        self.with_store(|store| store.clear()).await?;
        self.tonight = None;

        info!("cleared sleep data");
        self.events.push(TrackerEvent::Snackbar(CLEARED_MESSAGE.to_string()));
        Ok(())
    }

    /// A row of the session list was selected.
    pub fn select(&mut self, id: SessionId) {
        self.events.push(TrackerEvent::OpenSession(id));
    }

    /// Look up one session.
    pub async fn session(&self, id: SessionId) -> Result<Option<SleepSession>> {
        self.with_store(move |store| store.get(id)).await
    }

    /// The most recent session, if it has been stopped.
    pub async fn last_finished(&self) -> Result<Option<SleepSession>> {
        let night = self.most_recent().await?;
        Ok(night.filter(|night| !night.is_open()))
    }

    /// The most recently started session, open or not.
    pub async fn most_recent(&self) -> Result<Option<SleepSession>> {
        self.with_store(|store| store.most_recent()).await
    }

    /// The night currently being tracked.
    pub fn tonight(&self) -> Option<SleepSession> {
        self.tonight
    }

    pub fn start_visible(&self) -> bool {
        self.tonight.is_none()
    }

    pub fn stop_visible(&self) -> bool {
        self.tonight.is_some()
    }

    pub fn clear_visible(&self) -> bool {
        !self.nights.current().is_empty()
    }

    /// All tracked nights, newest first.
    pub fn nights(&self) -> Vec<SleepSession> {
        self.nights.current()
    }

    pub fn nights_text<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format_nights(&self.nights.current(), tz)
    }

    /// Whether the list of nights changed since [`next_change`](Self::next_change)
    /// last returned.
    pub fn nights_changed(&self) -> bool {
        self.nights.has_changed()
    }

    /// Wait until the list of nights changes.
    pub async fn next_change(&mut self) -> Option<Vec<SleepSession>> {
        self.nights.changed().await
    }

    /// The oldest event the screen has not acknowledged yet.
    pub fn pending_event(&self) -> Option<&TrackerEvent> {
        self.events.peek()
    }

    /// Mark the oldest pending event as handled.
    pub fn acknowledge_event(&mut self) -> Option<TrackerEvent> {
        self.events.acknowledge()
    }

    async fn load_tonight(&self) -> Result<Option<SleepSession>> {
        let night = self.most_recent().await?;
        Ok(night.filter(SleepSession::is_open))
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SleepStore) -> storage::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::Task(e.to_string()))?;
        Ok(result?)
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
