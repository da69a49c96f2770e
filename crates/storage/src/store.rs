//! SQLite sleep session store implementation.

use crate::{Error, Result, SessionId, SleepSession};
use rusqlite::{Connection, Params, Transaction, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::debug;

const SELECT_SESSIONS: &str =
    "SELECT id, start_time_millis, end_time_millis, sleep_quality FROM sleep_sessions";

/// SQLite-backed sleep session store.
///
/// Every mutation that changes the table republishes the full listing to all
/// [`SessionFeed`]s while the connection is still held, so subscribers see
/// states in commit order.
pub struct SleepStore {
    conn: Mutex<Connection>,
    listing: watch::Sender<Vec<SleepSession>>,
}

impl SleepStore {
    /// Open or create a sleep store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory sleep store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        let sessions = query_all(&conn)?;
        let (listing, _) = watch::channel(sessions);
        Ok(Self {
            conn: Mutex::new(conn),
            listing,
        })
    }

    /// Persist a new session.
    ///
    /// An unassigned id (`0`) lets the store pick the next one; any other id
    /// is stored as given and fails if it already exists.
    pub fn insert(&self, session: &SleepSession) -> Result<()> {
        self.write(|tx| {
            let id = session.id.is_assigned().then_some(session.id.0);
            tx.execute(
                "INSERT INTO sleep_sessions (id, start_time_millis, end_time_millis, sleep_quality)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    session.start_time_millis,
                    session.end_time_millis,
                    session.sleep_quality,
                ],
            )?;
            debug!(id = tx.last_insert_rowid(), "inserted sleep session");
            Ok(true)
        })
    }

    /// Overwrite the row with the session's id.
    ///
    /// Updating an id that does not exist succeeds without touching anything.
    pub fn update(&self, session: &SleepSession) -> Result<()> {
        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE sleep_sessions
                 SET start_time_millis = ?2, end_time_millis = ?3, sleep_quality = ?4
                 WHERE id = ?1",
                params![
                    session.id.0,
                    session.start_time_millis,
                    session.end_time_millis,
                    session.sleep_quality,
                ],
            )?;
            if changed == 0 {
                debug!(id = %session.id, "update matched no sleep session");
                return Ok(false);
            }
            debug!(id = %session.id, "updated sleep session");
            Ok(true)
        })
    }

    /// Look up a session by id.
    pub fn get(&self, id: SessionId) -> Result<Option<SleepSession>> {
        let conn = self.lock()?;
        query_one(&conn, &format!("{SELECT_SESSIONS} WHERE id = ?1"), [id.0])
    }

    /// The session with the greatest id, if any.
    pub fn most_recent(&self) -> Result<Option<SleepSession>> {
        let conn = self.lock()?;
        query_one(&conn, &format!("{SELECT_SESSIONS} ORDER BY id DESC LIMIT 1"), ())
    }

    /// All sessions, newest first.
    pub fn snapshot(&self) -> Result<Vec<SleepSession>> {
        let conn = self.lock()?;
        query_all(&conn)
    }

    /// Subscribe to the live listing of all sessions, newest first.
    pub fn list_all(&self) -> SessionFeed {
        SessionFeed {
            rx: self.listing.subscribe(),
        }
    }

    /// Delete every session.
    pub fn clear(&self) -> Result<()> {
        self.write(|tx| {
            let removed = tx.execute("DELETE FROM sleep_sessions", ())?;
            debug!(removed, "cleared sleep sessions");
            Ok(true)
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Run a mutation and re-read the listing in one transaction.
    ///
    /// The mutation returns whether it changed anything. A failed re-read
    /// rolls the mutation back, so an `Err` always means nothing was
    /// committed and every committed state is published.
    fn write<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&Transaction<'_>) -> Result<bool>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !mutate(&tx)? {
            return Ok(());
        }
        let sessions = query_all(&tx)?;
        tx.commit()?;

        let subscribers = self.listing.receiver_count();
        self.listing.send_replace(sessions);
        debug!(subscribers, "published sleep session listing");
        Ok(())
    }
}

/// Live view of the session listing.
///
/// Holds the latest published listing. Bursts of writes may be coalesced, but
/// the state after the last write is always delivered. Dropping the feed
/// unsubscribes.
#[derive(Debug, Clone)]
pub struct SessionFeed {
    rx: watch::Receiver<Vec<SleepSession>>,
}

impl SessionFeed {
    /// The most recently published listing.
    pub fn current(&self) -> Vec<SleepSession> {
        self.rx.borrow().clone()
    }

    /// Whether a listing was published that [`changed`](Self::changed) has
    /// not returned yet.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next published listing.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Vec<SleepSession>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sleep_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time_millis INTEGER NOT NULL,
            end_time_millis INTEGER NOT NULL,
            sleep_quality INTEGER NOT NULL DEFAULT -1
        );
        "#,
    )?;
    Ok(())
}

fn query_all(conn: &Connection) -> Result<Vec<SleepSession>> {
    let mut stmt = conn.prepare(&format!("{SELECT_SESSIONS} ORDER BY id DESC"))?;
    let rows = stmt.query(())?;
    let sessions = serde_rusqlite::from_rows::<SleepSession>(rows)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(sessions)
}

fn query_one(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<SleepSession>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query(params)?;
    let session = serde_rusqlite::from_rows::<SleepSession>(rows)
        .next()
        .transpose()?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNRATED;
    use std::time::Duration;
    use tokio::time::timeout;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    fn session(id: i64, start: i64, end: i64, quality: i32) -> SleepSession {
        SleepSession {
            id: SessionId(id),
            start_time_millis: start,
            end_time_millis: end,
            sleep_quality: quality,
        }
    }

    fn ids(sessions: &[SleepSession]) -> Vec<i64> {
        sessions.iter().map(|s| s.id.0).collect()
    }

    #[test]
    fn test_insert_then_get_returns_equal_session() {
        let store = SleepStore::in_memory().unwrap();
        let night = session(1, 1_000, 9_000, 4);
        store.insert(&night).unwrap();

        assert_eq!(store.get(SessionId(1)).unwrap(), Some(night));
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&SleepSession::new(1_000)).unwrap();
        store.insert(&SleepSession::new(2_000)).unwrap();

        let recent = store.most_recent().unwrap().unwrap();
        assert_eq!(recent.id, SessionId(2));
        assert_eq!(recent.start_time_millis, 2_000);
        assert_eq!(store.get(SessionId(1)).unwrap().unwrap().start_time_millis, 1_000);
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&session(1, 1_000, 1_000, UNRATED)).unwrap();

        let err = store.insert(&session(1, 2_000, 2_000, UNRATED)).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_most_recent_returns_open_session() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&session(1, 1_000, 4_000, 2)).unwrap();
        let open = session(2, 5_000, 5_000, UNRATED);
        store.insert(&open).unwrap();

        let recent = store.most_recent().unwrap().unwrap();
        assert_eq!(recent, open);
        assert!(recent.is_open());
    }

    #[test]
    fn test_update_closes_then_rates_session() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&session(1, 1_000, 1_000, UNRATED)).unwrap();

        store.update(&session(1, 1_000, 5_000, UNRATED)).unwrap();
        assert_eq!(
            store.get(SessionId(1)).unwrap(),
            Some(session(1, 1_000, 5_000, UNRATED))
        );

        store.update(&session(1, 1_000, 5_000, 3)).unwrap();
        assert_eq!(
            store.most_recent().unwrap(),
            Some(session(1, 1_000, 5_000, 3))
        );
    }

    #[test]
    fn test_update_only_touches_target_row() {
        let store = SleepStore::in_memory().unwrap();
        for id in 1..=3 {
            store.insert(&session(id, id * 1_000, id * 1_000, UNRATED)).unwrap();
        }

        store.update(&session(2, 2_000, 7_000, 5)).unwrap();

        let all = store.snapshot().unwrap();
        assert_eq!(
            all,
            vec![
                session(3, 3_000, 3_000, UNRATED),
                session(2, 2_000, 7_000, 5),
                session(1, 1_000, 1_000, UNRATED),
            ]
        );
    }

    #[test]
    fn test_update_unknown_id_is_silent_success() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&session(1, 1_000, 1_000, UNRATED)).unwrap();
        let feed = store.list_all();

        store.update(&session(42, 1_000, 2_000, 1)).unwrap();

        assert!(!feed.has_changed());
        assert_eq!(store.get(SessionId(42)).unwrap(), None);
        assert_eq!(ids(&store.snapshot().unwrap()), vec![1]);
        assert_eq!(ids(&feed.current()), vec![1]);
    }

    #[test]
    fn test_get_unknown_id_is_absent() {
        let store = SleepStore::in_memory().unwrap();
        assert_eq!(store.get(SessionId(99)).unwrap(), None);
        assert_eq!(store.most_recent().unwrap(), None);
    }

    #[test]
    fn test_listing_is_newest_first() {
        let store = SleepStore::in_memory().unwrap();
        for _ in 0..3 {
            store.insert(&SleepSession::new(1_000)).unwrap();
        }

        assert_eq!(ids(&store.snapshot().unwrap()), vec![3, 2, 1]);
        assert_eq!(ids(&store.list_all().current()), vec![3, 2, 1]);
    }

    #[test]
    fn test_clear_empties_table() {
        let store = SleepStore::in_memory().unwrap();
        store.insert(&SleepSession::new(1_000)).unwrap();
        store.insert(&SleepSession::new(2_000)).unwrap();

        store.clear().unwrap();

        assert!(store.snapshot().unwrap().is_empty());
        assert!(store.list_all().current().is_empty());
        assert_eq!(store.most_recent().unwrap(), None);
    }

    #[test]
    fn test_ids_not_reused_after_clear_or_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleep.db");

        {
            let store = SleepStore::open(&path).unwrap();
            store.insert(&SleepSession::new(1_000)).unwrap();
            store.insert(&SleepSession::new(2_000)).unwrap();
            store.clear().unwrap();
            store.insert(&SleepSession::new(3_000)).unwrap();
            assert_eq!(store.most_recent().unwrap().unwrap().id, SessionId(3));
        }

        let store = SleepStore::open(&path).unwrap();
        assert_eq!(ids(&store.list_all().current()), vec![3]);
        store.clear().unwrap();
        store.insert(&SleepSession::new(4_000)).unwrap();
        assert_eq!(store.most_recent().unwrap().unwrap().id, SessionId(4));
    }

    #[test]
    fn test_failed_relisting_rolls_back_write() {
        let store = SleepStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO sleep_sessions (id, start_time_millis, end_time_millis, sleep_quality)
                 VALUES (1, 1000, 1000, 'not a number')",
                (),
            )
            .unwrap();
        let feed = store.list_all();

        let err = store.insert(&session(2, 2_000, 2_000, UNRATED)).unwrap_err();

        assert!(matches!(err, Error::Row(_)));
        assert!(!feed.has_changed());
        let count: i64 = store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM sleep_sessions", (), |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_fails_when_directory_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sleep.db");

        assert!(matches!(SleepStore::open(&path), Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_feed_receives_insert_update_and_clear() {
        let store = SleepStore::in_memory().unwrap();
        let mut feed = store.list_all();
        assert!(feed.current().is_empty());

        store.insert(&session(1, 1_000, 1_000, UNRATED)).unwrap();
        let listing = timeout(TEST_TIMEOUT, feed.changed())
            .await
            .expect("insert notification timed out")
            .expect("store dropped");
        assert_eq!(listing, vec![session(1, 1_000, 1_000, UNRATED)]);

        store.update(&session(1, 1_000, 8_000, 2)).unwrap();
        let listing = timeout(TEST_TIMEOUT, feed.changed())
            .await
            .expect("update notification timed out")
            .expect("store dropped");
        assert_eq!(listing, vec![session(1, 1_000, 8_000, 2)]);

        store.clear().unwrap();
        let listing = timeout(TEST_TIMEOUT, feed.changed())
            .await
            .expect("clear notification timed out")
            .expect("store dropped");
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn test_feed_delivers_final_state_after_burst() {
        let store = SleepStore::in_memory().unwrap();
        let mut first = store.list_all();
        let mut second = store.list_all();

        for _ in 0..3 {
            store.insert(&SleepSession::new(1_000)).unwrap();
        }

        for feed in [&mut first, &mut second] {
            let listing = timeout(TEST_TIMEOUT, feed.changed())
                .await
                .expect("burst notification timed out")
                .expect("store dropped");
            assert_eq!(ids(&listing), vec![3, 2, 1]);
            assert!(!feed.has_changed());
        }
    }

    #[tokio::test]
    async fn test_feed_ends_when_store_dropped() {
        let store = SleepStore::in_memory().unwrap();
        let mut feed = store.list_all();
        drop(store);

        assert_eq!(feed.changed().await, None);
    }
}
