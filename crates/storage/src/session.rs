//! Sleep session record types.

use serde::{Deserialize, Serialize};

/// Quality value of a session that has not been rated yet.
pub const UNRATED: i32 = -1;

/// Primary key of a sleep session row.
///
/// Ids are assigned by the store in increasing order and are never reused,
/// not even after the table has been cleared.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl SessionId {
    /// Placeholder id for a session that has not been inserted yet.
    pub const UNASSIGNED: SessionId = SessionId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tracked sleep attempt.
///
/// While a session is open its end time equals its start time exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: SessionId,
    pub start_time_millis: i64,
    pub end_time_millis: i64,
    pub sleep_quality: i32,
}

impl SleepSession {
    /// A fresh, open and unrated session starting at `now_millis`.
    pub fn new(now_millis: i64) -> Self {
        Self {
            id: SessionId::UNASSIGNED,
            start_time_millis: now_millis,
            end_time_millis: now_millis,
            sleep_quality: UNRATED,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time_millis == self.start_time_millis
    }

    pub fn is_rated(&self) -> bool {
        self.sleep_quality != UNRATED
    }

    pub fn duration_millis(&self) -> i64 {
        self.end_time_millis - self.start_time_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_open_and_unrated() {
        let session = SleepSession::new(1_000);
        assert!(session.is_open());
        assert!(!session.is_rated());
        assert!(!session.id.is_assigned());
        assert_eq!(session.duration_millis(), 0);
    }

    #[test]
    fn closed_session_reports_duration() {
        let session = SleepSession {
            end_time_millis: 5_000,
            ..SleepSession::new(1_000)
        };
        assert!(!session.is_open());
        assert_eq!(session.duration_millis(), 4_000);
    }

    #[test]
    fn session_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&SessionId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
