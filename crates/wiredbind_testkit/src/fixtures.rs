//! Test fixtures and store helpers.
//!
//! Provides convenience functions for opening in-memory stores with a
//! ready table and common test scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use wiredbind_core::{Connection, ConnectionConfig, Cursor, Session};
use wiredbind_native::MemoryEngine;

/// Name of the table every fixture creates.
pub const TEST_TABLE: &str = "table:test";

static NEXT_HOME: AtomicUsize = AtomicUsize::new(0);

/// Returns a home name no other fixture in this process uses.
pub fn unique_home(prefix: &str) -> String {
    format!("{prefix}-{}", NEXT_HOME.fetch_add(1, Ordering::Relaxed))
}

/// An open in-memory store with one session and [`TEST_TABLE`] created.
pub struct TestStore {
    /// The session (declared first so it closes before the connection).
    pub session: Session,
    /// The connection.
    pub conn: Connection,
    /// The engine, for reopening the same home.
    pub engine: MemoryEngine,
    home: String,
}

impl TestStore {
    /// Opens a fresh store.
    pub fn memory() -> Self {
        Self::with_config(ConnectionConfig::new())
    }

    /// Opens a fresh store with a connection configuration.
    pub fn with_config(config: ConnectionConfig) -> Self {
        let engine = MemoryEngine::new();
        let home = unique_home("test");
        let conn = Connection::open(engine.clone(), &home, config.create(true))
            .expect("Failed to open memory store");
        let mut session = conn.open_session("").expect("Failed to open session");
        session
            .create(TEST_TABLE, "key_format=u,value_format=u")
            .expect("Failed to create test table");
        Self {
            session,
            conn,
            engine,
            home,
        }
    }

    /// The home the store was opened at.
    pub fn home(&self) -> &str {
        &self.home
    }

    /// Opens a cursor on [`TEST_TABLE`].
    pub fn cursor(&mut self) -> Cursor {
        self.cursor_with("")
    }

    /// Opens a cursor on [`TEST_TABLE`] with a cursor configuration.
    pub fn cursor_with(&mut self, config: &str) -> Cursor {
        self.session
            .open_cursor(TEST_TABLE, config)
            .expect("Failed to open cursor")
    }

    /// Opens a second session on the same connection.
    pub fn second_session(&self) -> Session {
        self.conn.open_session("").expect("Failed to open session")
    }
}

/// Inserts every key with its own bytes as the value.
pub fn populate<K: AsRef<[u8]>>(cursor: &mut Cursor, keys: impl IntoIterator<Item = K>) {
    for key in keys {
        let key = key.as_ref();
        cursor.insert(key, key).expect("Failed to insert key");
    }
}

/// Collects every key in order, leaving the cursor unpositioned.
pub fn collect_keys(cursor: &mut Cursor) -> Vec<Vec<u8>> {
    cursor.reset().expect("Failed to reset cursor");
    let mut keys = Vec::new();
    while cursor.next().expect("Failed to step cursor") {
        keys.push(cursor.key().expect("Failed to read key"));
    }
    keys
}

/// Runs a test with a cursor over a fresh table.
///
/// # Example
///
/// ```rust
/// use wiredbind_testkit::{populate, with_test_cursor};
///
/// let count = with_test_cursor(|cursor| {
///     populate(cursor, ["a", "b"]);
///     cursor.total_count(None, None).unwrap()
/// });
/// assert_eq!(count, 2);
/// ```
pub fn with_test_cursor<F, R>(f: F) -> R
where
    F: FnOnce(&mut Cursor) -> R,
{
    let mut store = TestStore::memory();
    let mut cursor = store.cursor();
    f(&mut cursor)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A store whose test table holds `count` zero-padded numeric keys.
    pub fn numbered_store(count: usize) -> TestStore {
        let mut store = TestStore::memory();
        let mut cursor = store.cursor();
        populate(&mut cursor, (0..count).map(|i| format!("{i:08}")));
        drop(cursor);
        store
    }
}
