//! In-memory session.

use super::config::ConfigReader;
use super::cursor::MemoryCursor;
use super::store::{SessionState, Store};
use crate::api::{NativeCursor, NativeSession};
use crate::status::{NativeResult, Status};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::trace;

pub(crate) struct MemorySession {
    store: Arc<Store>,
    state: Arc<SessionState>,
}

impl MemorySession {
    pub(crate) fn new(store: Arc<Store>, connection_alive: Arc<AtomicBool>) -> Self {
        let id = store.next_session_id();
        Self {
            store,
            state: Arc::new(SessionState::new(id, connection_alive)),
        }
    }

    fn shutdown(&self) {
        if self.state.is_usable() && self.state.in_txn() {
            self.store.rollback(self.state.id);
            self.state.set_in_txn(false);
        }
        self.state.kill();
    }
}

/// Data source names carry a type prefix, as in `table:orders`.
fn validate_uri(name: &str) -> NativeResult<()> {
    match name.split_once(':') {
        Some((kind, rest)) if !kind.is_empty() && !rest.is_empty() => Ok(()),
        _ => Err(Status::INVALID),
    }
}

impl NativeSession for MemorySession {
    fn begin_transaction(&mut self, _config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        if self.state.in_txn() {
            return Err(Status::INVALID);
        }
        self.state.set_in_txn(true);
        trace!(session = self.state.id, "transaction started");
        Ok(())
    }

    fn commit_transaction(&mut self, _config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        if !self.state.in_txn() {
            return Err(Status::INVALID);
        }
        self.store.commit(self.state.id);
        self.state.set_in_txn(false);
        Ok(())
    }

    fn rollback_transaction(&mut self, _config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        if !self.state.in_txn() {
            return Err(Status::INVALID);
        }
        self.store.rollback(self.state.id);
        self.state.set_in_txn(false);
        Ok(())
    }

    fn checkpoint(&mut self, _config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        if self.state.in_txn() {
            return Err(Status::INVALID);
        }
        Ok(())
    }

    fn compact(&mut self, name: &str, _config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        self.store.table(name).map(|_| ())
    }

    fn create(&mut self, name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        validate_uri(name)?;
        let config = ConfigReader::parse(config);
        self.store.create(name, config.flag("exclusive", false))
    }

    fn drop_object(&mut self, name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.ensure_usable()?;
        let config = ConfigReader::parse(config);
        self.store.drop_table(name, config.flag("force", false))
    }

    fn rename(
        &mut self,
        old_name: &str,
        new_name: &str,
        _config: Option<&str>,
    ) -> NativeResult<()> {
        self.state.ensure_usable()?;
        validate_uri(new_name)?;
        self.store.rename(old_name, new_name)
    }

    fn open_cursor(
        &mut self,
        uri: &str,
        config: Option<&str>,
    ) -> NativeResult<Box<dyn NativeCursor>> {
        self.state.ensure_usable()?;
        let table = self.store.table(uri)?;
        let config = ConfigReader::parse(config);
        Ok(Box::new(MemoryCursor::new(
            uri,
            Arc::clone(&self.store),
            table,
            Arc::clone(&self.state),
            config.flag("overwrite", true),
        )))
    }

    fn close(self: Box<Self>, _config: Option<&str>) -> NativeResult<()> {
        // Drop runs the shutdown.
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
