//! Binding of stored sessions to list rows.

use crate::format::{format_duration, quality_label};
use chrono::TimeZone;
use std::fmt::Display;
use storage::{SessionId, SleepSession};

/// Icon shown next to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIcon {
    /// A rated night, `0..=5`.
    Level(u8),
    /// Unrated or still being tracked.
    Active,
}

impl QualityIcon {
    pub fn for_quality(quality: i32) -> Self {
        match u8::try_from(quality) {
            Ok(level @ 0..=5) => Self::Level(level),
            _ => Self::Active,
        }
    }

    /// Terminal rendering of the icon.
    pub fn glyph(self) -> String {
        match self {
            Self::Level(level) => {
                let filled = usize::from(level);
                format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
            }
            Self::Active => "zzz".to_string(),
        }
    }
}

/// Display values for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: SessionId,
    pub duration: String,
    pub quality: String,
    pub icon: QualityIcon,
}

impl SessionRow {
    pub fn bind<Tz>(session: &SleepSession, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            id: session.id,
            duration: format_duration(session.start_time_millis, session.end_time_millis, tz),
            quality: quality_label(session.sleep_quality).to_string(),
            icon: QualityIcon::for_quality(session.sleep_quality),
        }
    }
}

/// Holds the sessions backing a list and binds them to rows on demand.
///
/// Replacing the data bumps [`revision`](Self::revision), which tells the
/// list that every row must be redrawn.
#[derive(Debug, Default)]
pub struct SessionListAdapter {
    data: Vec<SleepSession>,
    revision: u64,
}

impl SessionListAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, data: Vec<SleepSession>) {
        self.data = data;
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn item_count(&self) -> usize {
        self.data.len()
    }

    pub fn bind<Tz>(&self, position: usize, tz: &Tz) -> Option<SessionRow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.data
            .get(position)
            .map(|session| SessionRow::bind(session, tz))
    }

    pub fn rows<Tz>(&self, tz: &Tz) -> Vec<SessionRow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.data
            .iter()
            .map(|session| SessionRow::bind(session, tz))
            .collect()
    }
}
