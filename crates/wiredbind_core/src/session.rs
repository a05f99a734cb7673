//! Session handle.

use crate::cursor::Cursor;
use crate::error::{CoreError, CoreResult};
use crate::handle::{HandleKind, Lineage};
use crate::marshal::{config_arg, name_arg, ConfigArg};
use std::fmt;
use tracing::{debug, warn};
use wiredbind_native::{NativeResult, NativeSession};

/// A unit of transactional context.
///
/// A session is used by one thread at a time; it can be moved between
/// threads but not shared. Transaction brackets are forwarded to the engine,
/// which rejects misuse such as a second `begin_transaction`.
pub struct Session {
    native: Option<Box<dyn NativeSession>>,
    lineage: Lineage,
    in_transaction: bool,
}

impl Session {
    pub(crate) fn new(native: Box<dyn NativeSession>, lineage: Lineage) -> Self {
        debug!("session opened");
        Self {
            native: Some(native),
            lineage,
            in_transaction: false,
        }
    }

    fn with_native<T>(
        &mut self,
        f: impl FnOnce(&mut dyn NativeSession) -> NativeResult<T>,
    ) -> CoreResult<T> {
        self.lineage.ensure_live()?;
        let native = self
            .native
            .as_deref_mut()
            .ok_or(CoreError::closed(HandleKind::Session))?;
        self.lineage.check(f(native))
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns the engine error if a transaction is already running.
    pub fn begin_transaction(&mut self, config: impl ConfigArg) -> CoreResult<()> {
        let config = config_arg(&config)?;
        self.with_native(|s| s.begin_transaction(config.as_deref()))?;
        self.in_transaction = true;
        debug!("transaction started");
        Ok(())
    }

    /// Commits the running transaction.
    ///
    /// # Errors
    ///
    /// Returns the engine error if no transaction is running or the commit
    /// fails.
    pub fn commit_transaction(&mut self, config: impl ConfigArg) -> CoreResult<()> {
        let config = config_arg(&config)?;
        self.with_native(|s| s.commit_transaction(config.as_deref()))?;
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    /// Rolls back the running transaction.
    ///
    /// # Errors
    ///
    /// Returns the engine error if no transaction is running.
    pub fn rollback_transaction(&mut self, config: impl ConfigArg) -> CoreResult<()> {
        let config = config_arg(&config)?;
        self.with_native(|s| s.rollback_transaction(config.as_deref()))?;
        self.in_transaction = false;
        debug!("transaction rolled back");
        Ok(())
    }

    /// Returns true between a successful begin and the matching commit or
    /// rollback.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Runs `f` inside a transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    /// A failed commit is rolled back too, so the session is free for the
    /// next transaction.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or the engine error from begin or commit.
    pub fn transaction<F, T>(&mut self, config: impl ConfigArg, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Self) -> CoreResult<T>,
    {
        self.begin_transaction(config)?;
        let result = f(self).and_then(|value| self.commit_transaction("").map(|()| value));
        if let Err(err) = &result {
            if self.in_transaction {
                if let Err(rollback) = self.rollback_transaction("") {
                    warn!(error = %rollback, cause = %err, "rollback after failed transaction failed");
                }
            }
        }
        result
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Writes a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure, for example inside a transaction.
    pub fn checkpoint(&mut self, config: impl ConfigArg) -> CoreResult<()> {
        let config = config_arg(&config)?;
        self.with_native(|s| s.checkpoint(config.as_deref()))
    }

    /// Compacts a data source.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure.
    pub fn compact(&mut self, name: &str) -> CoreResult<()> {
        let name = name_arg(name)?;
        self.with_native(|s| s.compact(name, None))
    }

    /// Creates a data source such as `table:orders`.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure.
    pub fn create(&mut self, name: &str, config: impl ConfigArg) -> CoreResult<()> {
        let name = name_arg(name)?;
        let config = config_arg(&config)?;
        self.with_native(|s| s.create(name, config.as_deref()))?;
        debug!(name, "data source created");
        Ok(())
    }

    /// Drops a data source.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure, for example while a cursor is
    /// open on it.
    pub fn drop(&mut self, name: &str) -> CoreResult<()> {
        self.drop_with(name, "")
    }

    /// Drops a data source with a drop configuration such as `force=true`.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure.
    pub fn drop_with(&mut self, name: &str, config: impl ConfigArg) -> CoreResult<()> {
        let name = name_arg(name)?;
        let config = config_arg(&config)?;
        self.with_native(|s| s.drop_object(name, config.as_deref()))?;
        debug!(name, "data source dropped");
        Ok(())
    }

    /// Renames a data source.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> CoreResult<()> {
        let old_name = name_arg(old_name)?;
        let new_name = name_arg(new_name)?;
        self.with_native(|s| s.rename(old_name, new_name, None))
    }

    // ========================================================================
    // Cursors
    // ========================================================================

    /// Opens a cursor on a data source.
    ///
    /// # Errors
    ///
    /// Returns the engine error on failure, for example if the data source
    /// does not exist.
    pub fn open_cursor(&mut self, name: &str, config: impl ConfigArg) -> CoreResult<Cursor> {
        let name = name_arg(name)?;
        let config = config_arg(&config)?;
        let native = self.with_native(|s| s.open_cursor(name, config.as_deref()))?;
        Ok(Cursor::new(native, self.lineage.child(HandleKind::Cursor)))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Returns true once the session, or its connection, has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.native.is_none() || self.lineage.ensure_live().is_err()
    }

    /// Closes the session, rolling back a running transaction and
    /// invalidating its cursors. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the native close fails. The handle is
    /// released either way.
    pub fn close(&mut self) -> CoreResult<()> {
        let Some(native) = self.native.take() else {
            return Ok(());
        };
        self.lineage.close_own();
        self.in_transaction = false;
        if !self.lineage.ancestors_live() {
            // The connection already released every session.
            return Ok(());
        }
        let result = native.close(None);
        debug!(ok = result.is_ok(), "session closed");
        self.lineage.check(result)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("in_transaction", &self.in_transaction)
            .field("is_closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::error::ErrorKind;
    use wiredbind_native::{MemoryEngine, EBUSY, EINVAL, ENOENT};

    fn is_send<T: Send>() {}

    fn open() -> (Connection, Session) {
        let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
        let mut session = conn.open_session("").unwrap();
        session.create("table:t", "key_format=u,value_format=u").unwrap();
        (conn, session)
    }

    #[test]
    fn session_is_send() {
        is_send::<Session>();
    }

    #[test]
    fn transaction_misuse_surfaces_engine_error() {
        let (_conn, mut session) = open();
        let err = session.commit_transaction("").unwrap_err();
        assert_eq!(err.native_code(), Some(EINVAL));

        session.begin_transaction("").unwrap();
        assert!(session.in_transaction());
        let err = session.begin_transaction("").unwrap_err();
        assert_eq!(err.native_code(), Some(EINVAL));
        assert!(session.in_transaction());

        session.rollback_transaction("").unwrap();
        assert!(!session.in_transaction());
    }

    #[test]
    fn transaction_closure_rolls_back_on_error() {
        let (_conn, mut session) = open();
        let result: CoreResult<()> = session.transaction("", |s| {
            let mut cursor = s.open_cursor("table:t", "")?;
            cursor.insert(b"k", b"v")?;
            Err(CoreError::invalid_argument("abort"))
        });
        assert!(result.is_err());
        assert!(!session.in_transaction());

        let mut cursor = session.open_cursor("table:t", "").unwrap();
        assert!(!cursor.search(b"k").unwrap());
    }

    #[test]
    fn transaction_closure_commits() {
        let (_conn, mut session) = open();
        let value = session
            .transaction("isolation=snapshot", |s| {
                let mut cursor = s.open_cursor("table:t", "")?;
                cursor.insert(b"k", b"v")?;
                Ok(42)
            })
            .unwrap();
        assert_eq!(value, 42);
        session.rollback_transaction("").unwrap_err();
    }

    #[test]
    fn schema_operations() {
        let (_conn, mut session) = open();
        session.compact("table:t").unwrap();
        session.checkpoint("").unwrap();

        let cursor = session.open_cursor("table:t", "").unwrap();
        let err = session.drop("table:t").unwrap_err();
        assert_eq!(err.native_code(), Some(EBUSY));
        drop(cursor);

        session.rename("table:t", "table:u").unwrap();
        let err = session.open_cursor("table:t", "").unwrap_err();
        assert_eq!(err.native_code(), Some(ENOENT));

        session.drop("table:u").unwrap();
        session.drop_with("table:u", "force=true").unwrap();
        assert!(session.create("", "").is_err());
    }

    #[test]
    fn checkpoint_inside_transaction_fails() {
        let (_conn, mut session) = open();
        session.begin_transaction("").unwrap();
        let err = session.checkpoint("").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Generic));
    }

    #[test]
    fn closing_connection_invalidates_session() {
        let (mut conn, mut session) = open();
        conn.close().unwrap();
        assert!(session.is_closed());
        assert_eq!(
            session.begin_transaction(""),
            Err(CoreError::closed(HandleKind::Session))
        );
        session.close().unwrap();
    }

    #[test]
    fn double_close_is_noop() {
        let (_conn, mut session) = open();
        session.close().unwrap();
        session.close().unwrap();
        assert!(session.is_closed());
    }
}
