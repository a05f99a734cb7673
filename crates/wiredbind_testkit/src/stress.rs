//! Stress helpers.
//!
//! Runs concurrent writers against one shared connection, each on its own
//! session, and reports how many transactions committed or hit a conflict.

use crate::fixtures::TEST_TABLE;
use std::thread;
use std::time::{Duration, Instant};
use wiredbind_core::{Connection, CoreResult};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Transactions that committed.
    pub committed: usize,
    /// Transactions rolled back after a conflict.
    pub conflicts: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Transactions attempted.
    pub fn attempted(&self) -> usize {
        self.committed + self.conflicts
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of writer threads.
    pub threads: usize,
    /// Transactions per thread.
    pub transactions: usize,
    /// Distinct keys shared by all writers. Fewer keys, more conflicts.
    pub key_space: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            transactions: 50,
            key_space: 8,
        }
    }
}

fn writer(conn: &Connection, id: usize, config: &StressConfig) -> CoreResult<(usize, usize)> {
    let mut session = conn.open_session("")?;
    let (mut committed, mut conflicts) = (0, 0);
    for n in 0..config.transactions {
        let key = format!("key-{:04}", (id * 7 + n) % config.key_space.max(1));
        let value = format!("writer-{id}-{n}");
        let outcome = session.transaction("", |s| {
            let mut cursor = s.open_cursor(TEST_TABLE, "")?;
            cursor.insert(key.as_bytes(), value.as_bytes())
        });
        match outcome {
            Ok(()) => committed += 1,
            Err(err) if err.is_retryable() => conflicts += 1,
            Err(err) => return Err(err),
        }
    }
    Ok((committed, conflicts))
}

/// Runs concurrent transactional writers against `conn`.
///
/// The connection must already contain [`TEST_TABLE`].
///
/// # Errors
///
/// Returns the first non-retryable error any writer hit.
pub fn run_concurrent_writers(conn: &Connection, config: &StressConfig) -> CoreResult<StressTestResult> {
    let start = Instant::now();
    let outcomes: Vec<CoreResult<(usize, usize)>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.threads)
            .map(|id| scope.spawn(move || writer(conn, id, config)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("writer thread panicked"))
            .collect()
    });

    let mut result = StressTestResult {
        committed: 0,
        conflicts: 0,
        duration: Duration::ZERO,
    };
    for outcome in outcomes {
        let (committed, conflicts) = outcome?;
        result.committed += committed;
        result.conflicts += conflicts;
    }
    result.duration = start.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;

    #[test]
    fn every_transaction_is_accounted_for() {
        let store = TestStore::memory();
        let config = StressConfig {
            threads: 3,
            transactions: 20,
            key_space: 4,
        };
        let result = run_concurrent_writers(&store.conn, &config).unwrap();
        assert_eq!(result.attempted(), 60);
        assert!(result.committed > 0);
    }
}
