//! Benchmark utilities.

use rand::Rng;
use wiredbind_core::{Connection, ConnectionConfig, CoreResult, Cursor, Session};
use wiredbind_native::MemoryEngine;

/// Table every benchmark works on.
pub const BENCH_TABLE: &str = "table:bench";

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Zero-padded key for `n`, so byte order matches numeric order.
pub fn key(n: u64) -> Vec<u8> {
    format!("key-{n:010}").into_bytes()
}

/// Generate `count` random keys drawn from `0..space`.
pub fn random_keys(count: usize, space: u64) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| key(rng.gen_range(0..space))).collect()
}

/// An in-memory store with an empty bench table.
///
/// Field order matters: the session closes before the connection.
pub struct BenchStore {
    /// Session that owns the table.
    pub session: Session,
    /// Underlying connection.
    pub conn: Connection,
}

impl BenchStore {
    /// Opens a fresh store.
    pub fn open() -> CoreResult<Self> {
        let conn = Connection::open(
            MemoryEngine::new(),
            "bench",
            ConnectionConfig::new().in_memory(true),
        )?;
        let mut session = conn.open_session("")?;
        session.create(BENCH_TABLE, "")?;
        Ok(Self { session, conn })
    }

    /// Opens a store holding keys `0..records` with `value_size` byte
    /// values.
    pub fn populated(records: u64, value_size: usize) -> CoreResult<Self> {
        let mut store = Self::open()?;
        let value = random_data(value_size);
        let mut cursor = store.cursor()?;
        for n in 0..records {
            cursor.insert(&key(n), &value)?;
        }
        cursor.close()?;
        Ok(store)
    }

    /// Opens a cursor on the bench table.
    pub fn cursor(&mut self) -> CoreResult<Cursor> {
        self.session.open_cursor(BENCH_TABLE, "")
    }
}
