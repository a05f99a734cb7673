//! In-memory engine.

mod config;
mod cursor;
mod session;
mod store;

pub use config::ConfigReader;

use crate::api::{NativeConnection, NativeEngine, NativeSession};
use crate::status::{NativeResult, Status};
use parking_lot::Mutex;
use session::MemorySession;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store::Store;
use tracing::debug;

type Homes = Arc<Mutex<HashMap<String, Arc<Store>>>>;

/// An engine keeping its stores in memory.
///
/// Stores are registered by home. Closing a connection keeps the store's
/// tables so a later `open` of the same home sees them (and reports
/// `is_new() == false`), unless the store was opened with `in_memory=true`,
/// in which case it disappears with its connection.
///
/// Recognised configuration:
///
/// - open: `create`, `exclusive`, `in_memory`, `cache_size`
/// - create: `exclusive`
/// - drop: `force`
/// - open_cursor: `overwrite` (default `true`)
///
/// Other keys are accepted and ignored.
///
/// # Thread Safety
///
/// The engine and its connections can be shared across threads. Writes from
/// different sessions to a key that is uncommitted in another session's
/// transaction fail with `WT_ROLLBACK`.
///
/// # Example
///
/// ```rust
/// use wiredbind_native::{MemoryEngine, NativeEngine, ENOENT};
///
/// let engine = MemoryEngine::new();
/// assert_eq!(engine.open("missing", None).err().map(|s| s.code()), Some(ENOENT));
///
/// let conn = engine.open("db", Some("create")).unwrap();
/// assert!(conn.is_new());
/// conn.close(None).unwrap();
///
/// let conn = engine.open("db", None).unwrap();
/// assert!(!conn.is_new());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    homes: Homes,
}

impl MemoryEngine {
    /// Creates an engine with no stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the homes of all stores known to the engine.
    #[must_use]
    pub fn homes(&self) -> Vec<String> {
        let mut homes: Vec<String> = self.homes.lock().keys().cloned().collect();
        homes.sort();
        homes
    }
}

impl NativeEngine for MemoryEngine {
    fn open(&self, home: &str, config: Option<&str>) -> NativeResult<Box<dyn NativeConnection>> {
        let config = ConfigReader::parse(config);
        let mut homes = self.homes.lock();

        let (store, is_new) = match homes.get(home) {
            Some(store) => {
                if config.flag("exclusive", false) {
                    return Err(Status::EXISTS);
                }
                if store.open.swap(true, Ordering::AcqRel) {
                    return Err(Status::BUSY);
                }
                (Arc::clone(store), false)
            }
            None => {
                if !config.flag("create", false) {
                    return Err(Status::NO_ENTRY);
                }
                let store = Arc::new(Store::new(home, &config));
                store.open.store(true, Ordering::Release);
                homes.insert(home.to_string(), Arc::clone(&store));
                (store, true)
            }
        };

        debug!(home, is_new, in_memory = store.in_memory, "memory store opened");
        Ok(Box::new(MemoryConnection {
            store,
            is_new,
            alive: Arc::new(AtomicBool::new(true)),
            homes: Arc::clone(&self.homes),
        }))
    }
}

struct MemoryConnection {
    store: Arc<Store>,
    is_new: bool,
    alive: Arc<AtomicBool>,
    homes: Homes,
}

impl MemoryConnection {
    fn ensure_alive(&self) -> NativeResult<()> {
        if self.alive.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Status::INVALID)
        }
    }

    fn shutdown(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        self.store.rollback_all();
        self.store.open.store(false, Ordering::Release);
        if self.store.in_memory {
            self.homes.lock().remove(&self.store.home);
        }
        debug!(home = %self.store.home, "memory store closed");
    }
}

impl NativeConnection for MemoryConnection {
    fn open_session(&self, _config: Option<&str>) -> NativeResult<Box<dyn NativeSession>> {
        self.ensure_alive()?;
        Ok(Box::new(MemorySession::new(
            Arc::clone(&self.store),
            Arc::clone(&self.alive),
        )))
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn home(&self) -> &str {
        &self.store.home
    }

    fn async_flush(&self) -> NativeResult<()> {
        // No asynchronous operations are ever queued.
        self.ensure_alive()
    }

    fn reconfigure(&self, _config: Option<&str>) -> NativeResult<()> {
        self.ensure_alive()
    }

    fn close(self: Box<Self>, _config: Option<&str>) -> NativeResult<()> {
        self.shutdown();
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}
