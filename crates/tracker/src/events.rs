//! One-shot events raised by the tracker.

use std::collections::VecDeque;
use storage::SessionId;

/// Something the screen should do exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A session was just closed and should be rated.
    RateSession(SessionId),
    /// A rating was saved; go back to the tracker.
    ReturnToTracker,
    /// A row of the session list was selected.
    OpenSession(SessionId),
    /// Show a transient message.
    Snackbar(String),
}

/// FIFO of events waiting to be handled.
///
/// An event stays at the front until it is acknowledged, so a consumer that
/// is recreated before handling it sees it again, and one that has handled it
/// never does.
#[derive(Debug)]
pub struct EventQueue<T> {
    pending: VecDeque<T>,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<T> EventQueue<T> {
    pub fn push(&mut self, event: T) {
        self.pending.push_back(event);
    }

    /// The oldest unacknowledged event.
    pub fn peek(&self) -> Option<&T> {
        self.pending.front()
    }

    /// Mark the oldest event as handled and remove it.
    pub fn acknowledge(&mut self) -> Option<T> {
        self.pending.pop_front()
    }
}
