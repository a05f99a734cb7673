//! Connection handle.

use crate::error::{CoreError, CoreResult, ErrorTranslator};
use crate::handle::{HandleKind, Lineage};
use crate::marshal::{config_arg, ConfigArg};
use crate::session::Session;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use wiredbind_native::{NativeConnection, NativeEngine, NativeResult};

/// An open store.
///
/// A connection may be shared between threads. Closing it, explicitly or by
/// dropping it, releases the native handle once and invalidates every
/// session and cursor opened from it.
///
/// # Example
///
/// ```rust
/// use wiredbind_core::{Connection, ConnectionConfig};
/// use wiredbind_native::MemoryEngine;
///
/// let engine = MemoryEngine::new();
/// let mut conn = Connection::open(engine.clone(), "db", ConnectionConfig::new()).unwrap();
/// assert!(conn.is_new());
/// conn.close().unwrap();
///
/// let conn = Connection::open(engine, "db", "").unwrap();
/// assert!(!conn.is_new());
/// ```
pub struct Connection {
    native: Option<Box<dyn NativeConnection>>,
    lineage: Lineage,
    home: String,
    is_new: bool,
}

impl Connection {
    /// Opens the store at `home`.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the store cannot be opened, for example
    /// because it does not exist and `create` was not requested.
    pub fn open<E>(engine: E, home: &str, config: impl ConfigArg) -> CoreResult<Self>
    where
        E: NativeEngine + 'static,
    {
        Self::open_shared(Arc::new(engine), home, config)
    }

    /// Opens the store at `home` through an already shared engine.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the store cannot be opened.
    pub fn open_shared(
        engine: Arc<dyn NativeEngine>,
        home: &str,
        config: impl ConfigArg,
    ) -> CoreResult<Self> {
        let config = config_arg(&config)?;
        let translator = ErrorTranslator::new(Arc::clone(&engine));
        let lineage = Lineage::root(HandleKind::Connection, translator);
        let native = lineage.check(engine.open(home, config.as_deref()))?;
        let is_new = native.is_new();
        debug!(engine = engine.name(), home, is_new, "connection opened");
        Ok(Self {
            native: Some(native),
            lineage,
            home: home.to_string(),
            is_new,
        })
    }

    fn with_native<T>(
        &self,
        f: impl FnOnce(&dyn NativeConnection) -> NativeResult<T>,
    ) -> CoreResult<T> {
        self.lineage.ensure_live()?;
        let native = self
            .native
            .as_deref()
            .ok_or(CoreError::closed(HandleKind::Connection))?;
        self.lineage.check(f(native))
    }

    /// Opens a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the engine refuses.
    pub fn open_session(&self, config: impl ConfigArg) -> CoreResult<Session> {
        let config = config_arg(&config)?;
        let native = self.with_native(|conn| conn.open_session(config.as_deref()))?;
        Ok(Session::new(native, self.lineage.child(HandleKind::Session)))
    }

    /// Returns true if opening this connection created the store.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// The home the connection was opened with.
    #[must_use]
    pub fn home(&self) -> &str {
        &self.home
    }

    /// The name of the engine behind this connection.
    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        self.lineage.translator().engine().name()
    }

    /// Returns true once the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.native.is_none()
    }

    /// Waits for outstanding asynchronous operations to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the engine fails.
    pub fn async_flush(&self) -> CoreResult<()> {
        self.with_native(|conn| conn.async_flush())
    }

    /// Applies a runtime configuration change.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the engine rejects
    /// the configuration.
    pub fn reconfigure(&self, config: impl ConfigArg) -> CoreResult<()> {
        let config = config_arg(&config)?;
        self.with_native(|conn| conn.reconfigure(config.as_deref()))
    }

    /// Closes the connection. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the native close fails. The handle is
    /// released either way.
    pub fn close(&mut self) -> CoreResult<()> {
        self.close_with("")
    }

    /// Closes the connection with a close configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a configuration holding a
    /// NUL byte, leaving the connection open. Otherwise see
    /// [`close`](Self::close).
    pub fn close_with(&mut self, config: impl ConfigArg) -> CoreResult<()> {
        if self.native.is_none() {
            return Ok(());
        }
        let config = config_arg(&config)?;
        let Some(native) = self.native.take() else {
            return Ok(());
        };
        self.lineage.close_own();
        if self.lineage.is_poisoned() {
            debug!(home = %self.home, "poisoned connection released");
            return Ok(());
        }
        let result = native.close(config.as_deref());
        debug!(home = %self.home, ok = result.is_ok(), "connection closed");
        result.map_err(|status| self.lineage.translator().translate(status).into())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("home", &self.home)
            .field("is_new", &self.is_new)
            .field("is_closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(home = %self.home, error = %err, "failed to close connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiredbind_native::{MemoryEngine, EBUSY, ENOENT};

    fn is_send_sync<T: Send + Sync>() {}

    #[test]
    fn connection_is_send_and_sync() {
        is_send_sync::<Connection>();
    }

    #[test]
    fn close_rejects_nul_config_and_stays_open() {
        let engine = MemoryEngine::new();
        let mut conn = Connection::open(engine.clone(), "db", "create").unwrap();
        let err = conn.close_with("leak_memory\0").unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert!(!conn.is_closed());
        conn.open_session("").unwrap().close().unwrap();

        conn.close_with("leak_memory=false").unwrap();
        assert!(conn.is_closed());
        assert!(Connection::open(engine, "db", "").is_ok());
    }

    #[test]
    fn open_missing_without_create() {
        let err = Connection::open(MemoryEngine::new(), "missing", "").unwrap_err();
        assert_eq!(err.native_code(), Some(ENOENT));
        assert_eq!(err.kind(), Some(ErrorKind::Generic));
    }

    #[test]
    fn reopen_reports_existing_store() {
        let engine = MemoryEngine::new();
        let mut conn = Connection::open(engine.clone(), "db", "create").unwrap();
        assert!(conn.is_new());
        assert_eq!(conn.home(), "db");
        assert_eq!(conn.engine_name(), "WiredTiger");

        let busy = Connection::open(engine.clone(), "db", "create").unwrap_err();
        assert_eq!(busy.native_code(), Some(EBUSY));

        conn.close().unwrap();
        let conn = Connection::open(engine, "db", "create").unwrap();
        assert!(!conn.is_new());
    }

    #[test]
    fn double_close_is_noop() {
        let mut conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
        conn.close().unwrap();
        assert!(conn.is_closed());
        conn.close().unwrap();
        assert_eq!(
            conn.async_flush(),
            Err(CoreError::closed(HandleKind::Connection))
        );
    }

    #[test]
    fn flush_and_reconfigure() {
        let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
        conn.async_flush().unwrap();
        conn.reconfigure("eviction=(threads_max=2)").unwrap();
        conn.reconfigure("").unwrap();
    }

    #[test]
    fn drop_releases_store() {
        let engine = MemoryEngine::new();
        drop(Connection::open(engine.clone(), "db", "create").unwrap());
        // Reopening would be busy if the native handle leaked.
        Connection::open(engine, "db", "").unwrap();
    }
}
