//! Fault injection.
//!
//! [`FaultEngine`] wraps a [`MemoryEngine`] and makes chosen native calls
//! fail with a chosen status code. It also counts the fallible native calls
//! that reach it, so tests can check that a poisoned connection stops
//! talking to the engine.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiredbind_native::{
    MemoryEngine, NativeConnection, NativeCursor, NativeEngine, NativeResult, NativeSession,
    Status,
};

/// A native call a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `NativeConnection::open_session`.
    OpenSession,
    /// `NativeConnection::async_flush`.
    AsyncFlush,
    /// `NativeSession::begin_transaction`.
    BeginTransaction,
    /// `NativeSession::commit_transaction`.
    CommitTransaction,
    /// `NativeCursor::get_key`.
    CursorGetKey,
    /// `NativeCursor::next`.
    CursorNext,
    /// `NativeCursor::insert`.
    CursorInsert,
    /// `NativeCursor::reset`.
    CursorReset,
    /// `NativeCursor::search_near`.
    CursorSearchNear,
    /// `NativeCursor::close`.
    CursorClose,
}

#[derive(Debug, Default)]
struct FaultState {
    faults: Mutex<HashMap<FaultPoint, i32>>,
    calls: AtomicUsize,
}

impl FaultState {
    fn call(&self, point: Option<FaultPoint>) -> NativeResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let code = point.and_then(|p| self.faults.lock().get(&p).copied());
        match code.and_then(Status::new) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

/// An engine whose calls can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct FaultEngine {
    inner: MemoryEngine,
    state: Arc<FaultState>,
}

impl FaultEngine {
    /// Wraps a fresh memory engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call at `point` fail with `code` until cleared.
    pub fn inject(&self, point: FaultPoint, code: i32) {
        self.state.faults.lock().insert(point, code);
    }

    /// Removes the fault at `point`.
    pub fn clear(&self, point: FaultPoint) {
        self.state.faults.lock().remove(&point);
    }

    /// Number of fallible native calls made so far.
    pub fn native_calls(&self) -> usize {
        self.state.calls.load(Ordering::Relaxed)
    }
}

impl NativeEngine for FaultEngine {
    fn open(&self, home: &str, config: Option<&str>) -> NativeResult<Box<dyn NativeConnection>> {
        self.state.call(None)?;
        let inner = self.inner.open(home, config)?;
        Ok(Box::new(FaultConnection {
            inner,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FaultConnection {
    inner: Box<dyn NativeConnection>,
    state: Arc<FaultState>,
}

impl NativeConnection for FaultConnection {
    fn open_session(&self, config: Option<&str>) -> NativeResult<Box<dyn NativeSession>> {
        self.state.call(Some(FaultPoint::OpenSession))?;
        let inner = self.inner.open_session(config)?;
        Ok(Box::new(FaultSession {
            inner,
            state: Arc::clone(&self.state),
        }))
    }

    fn is_new(&self) -> bool {
        self.inner.is_new()
    }

    fn home(&self) -> &str {
        self.inner.home()
    }

    fn async_flush(&self) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::AsyncFlush))?;
        self.inner.async_flush()
    }

    fn reconfigure(&self, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.reconfigure(config)
    }

    fn close(self: Box<Self>, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.close(config)
    }
}

struct FaultSession {
    inner: Box<dyn NativeSession>,
    state: Arc<FaultState>,
}

impl NativeSession for FaultSession {
    fn begin_transaction(&mut self, config: Option<&str>) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::BeginTransaction))?;
        self.inner.begin_transaction(config)
    }

    fn commit_transaction(&mut self, config: Option<&str>) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::CommitTransaction))?;
        self.inner.commit_transaction(config)
    }

    fn rollback_transaction(&mut self, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.rollback_transaction(config)
    }

    fn checkpoint(&mut self, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.checkpoint(config)
    }

    fn compact(&mut self, name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.compact(name, config)
    }

    fn create(&mut self, name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.create(name, config)
    }

    fn drop_object(&mut self, name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.drop_object(name, config)
    }

    fn rename(&mut self, old_name: &str, new_name: &str, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.rename(old_name, new_name, config)
    }

    fn open_cursor(&mut self, uri: &str, config: Option<&str>) -> NativeResult<Box<dyn NativeCursor>> {
        self.state.call(None)?;
        let inner = self.inner.open_cursor(uri, config)?;
        Ok(Box::new(FaultCursor {
            inner,
            state: Arc::clone(&self.state),
        }))
    }

    fn close(self: Box<Self>, config: Option<&str>) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.close(config)
    }
}

struct FaultCursor {
    inner: Box<dyn NativeCursor>,
    state: Arc<FaultState>,
}

impl NativeCursor for FaultCursor {
    fn uri(&self) -> &str {
        self.inner.uri()
    }

    fn set_key(&mut self, key: &[u8]) {
        self.inner.set_key(key);
    }

    fn set_value(&mut self, value: &[u8]) {
        self.inner.set_value(value);
    }

    fn get_key(&self) -> NativeResult<&[u8]> {
        self.state.call(Some(FaultPoint::CursorGetKey))?;
        self.inner.get_key()
    }

    fn get_value(&self) -> NativeResult<&[u8]> {
        self.state.call(None)?;
        self.inner.get_value()
    }

    fn next(&mut self) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::CursorNext))?;
        self.inner.next()
    }

    fn prev(&mut self) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.prev()
    }

    fn reset(&mut self) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::CursorReset))?;
        self.inner.reset()
    }

    fn search(&mut self) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.search()
    }

    fn search_near(&mut self) -> NativeResult<i32> {
        self.state.call(Some(FaultPoint::CursorSearchNear))?;
        self.inner.search_near()
    }

    fn insert(&mut self) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::CursorInsert))?;
        self.inner.insert()
    }

    fn remove(&mut self) -> NativeResult<()> {
        self.state.call(None)?;
        self.inner.remove()
    }

    fn close(self: Box<Self>) -> NativeResult<()> {
        self.state.call(Some(FaultPoint::CursorClose))?;
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiredbind_native::{WT_ERROR, WT_NOTFOUND};

    #[test]
    fn injected_faults_fire_until_cleared() {
        let engine = FaultEngine::new();
        let conn = engine.open("db", Some("create")).unwrap();
        let mut session = conn.open_session(None).unwrap();
        session.create("table:t", None).unwrap();
        let mut cursor = session.open_cursor("table:t", None).unwrap();

        engine.inject(FaultPoint::CursorNext, WT_ERROR);
        assert_eq!(cursor.next().unwrap_err().code(), WT_ERROR);

        engine.clear(FaultPoint::CursorNext);
        assert_eq!(cursor.next().unwrap_err().code(), WT_NOTFOUND);
    }

    #[test]
    fn calls_are_counted() {
        let engine = FaultEngine::new();
        let conn = engine.open("db", Some("create")).unwrap();
        let before = engine.native_calls();
        conn.async_flush().unwrap();
        assert_eq!(engine.native_calls(), before + 1);
    }
}
