//! Handle liveness tracking.
//!
//! Every wrapper owns a `Lifeline`. A child handle holds the lifelines of
//! all its ancestors (its `Lineage`) and checks them before each native
//! call, so closing a connection or session invalidates the handles opened
//! from it without leaving them pointing at released native memory.

use crate::error::{CoreError, CoreResult, EngineError, ErrorKind, ErrorTranslator};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wiredbind_native::NativeResult;

/// The kind of a binding handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A [`Connection`](crate::Connection).
    Connection,
    /// A [`Session`](crate::Session).
    Session,
    /// A [`Cursor`](crate::Cursor).
    Cursor,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connection => "connection",
            Self::Session => "session",
            Self::Cursor => "cursor",
        })
    }
}

#[derive(Debug, Default)]
struct LifelineState {
    closed: AtomicBool,
    poison: Mutex<Option<EngineError>>,
}

/// Shared liveness flag of one handle.
#[derive(Debug, Clone)]
pub(crate) struct Lifeline {
    kind: HandleKind,
    state: Arc<LifelineState>,
}

impl Lifeline {
    fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            state: Arc::default(),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.state.closed.store(true, Ordering::Release);
    }

    fn poison(&self) -> Option<EngineError> {
        self.state.poison.lock().clone()
    }
}

/// A handle's own lifeline plus those of its ancestors, root first.
#[derive(Debug, Clone)]
pub(crate) struct Lineage {
    translator: ErrorTranslator,
    links: Vec<Lifeline>,
}

impl Lineage {
    /// Starts a lineage for a root handle.
    pub(crate) fn root(kind: HandleKind, translator: ErrorTranslator) -> Self {
        Self {
            translator,
            links: vec![Lifeline::new(kind)],
        }
    }

    /// Derives the lineage of a handle opened from this one.
    pub(crate) fn child(&self, kind: HandleKind) -> Self {
        let mut links = self.links.clone();
        links.push(Lifeline::new(kind));
        Self {
            translator: self.translator.clone(),
            links,
        }
    }

    pub(crate) fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }

    fn own(&self) -> &Lifeline {
        // A lineage always has at least its own link.
        &self.links[self.links.len() - 1]
    }

    fn root_link(&self) -> &Lifeline {
        &self.links[0]
    }

    pub(crate) fn kind(&self) -> HandleKind {
        self.own().kind
    }

    /// Fails if the handle or an ancestor is closed, or the connection is
    /// poisoned.
    pub(crate) fn ensure_live(&self) -> CoreResult<()> {
        if let Some(err) = self.root_link().poison() {
            return Err(CoreError::Engine(err));
        }
        if self.links.iter().any(Lifeline::is_closed) {
            return Err(CoreError::closed(self.kind()));
        }
        Ok(())
    }

    /// Returns true if every ancestor is open and the connection is not
    /// poisoned, so the native handle may still be released through the
    /// engine.
    pub(crate) fn ancestors_live(&self) -> bool {
        let ancestors = &self.links[..self.links.len() - 1];
        self.root_link().poison().is_none() && !ancestors.iter().any(Lifeline::is_closed)
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.root_link().poison().is_some()
    }

    /// Translates the outcome of a native call. A fatal error poisons the
    /// whole connection.
    pub(crate) fn check<T>(&self, result: NativeResult<T>) -> CoreResult<T> {
        result.map_err(|status| {
            let err = self.translator.translate(status);
            if err.kind() == ErrorKind::Panic {
                let mut poison = self.root_link().state.poison.lock();
                if poison.is_none() {
                    tracing::error!(error = %err, "engine panic, connection poisoned");
                    *poison = Some(err.clone());
                }
            }
            CoreError::Engine(err)
        })
    }

    /// Marks this handle closed, invalidating its descendants.
    pub(crate) fn close_own(&self) {
        self.own().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiredbind_native::{MemoryEngine, Status, WT_NOTFOUND, WT_PANIC};

    fn root() -> Lineage {
        let translator = ErrorTranslator::new(Arc::new(MemoryEngine::new()));
        Lineage::root(HandleKind::Connection, translator)
    }

    fn status(code: i32) -> Status {
        Status::new(code).unwrap()
    }

    #[test]
    fn closing_parent_invalidates_children() {
        let conn = root();
        let session = conn.child(HandleKind::Session);
        let cursor = session.child(HandleKind::Cursor);

        assert!(cursor.ensure_live().is_ok());
        session.close_own();

        assert_eq!(
            cursor.ensure_live(),
            Err(CoreError::closed(HandleKind::Cursor))
        );
        assert!(!cursor.ancestors_live());
        assert!(conn.ensure_live().is_ok());
    }

    #[test]
    fn sibling_close_is_independent() {
        let conn = root();
        let a = conn.child(HandleKind::Session);
        let b = conn.child(HandleKind::Session);
        a.close_own();
        assert!(a.ensure_live().is_err());
        assert!(b.ensure_live().is_ok());
    }

    #[test]
    fn panic_poisons_connection() {
        let conn = root();
        let cursor = conn.child(HandleKind::Session).child(HandleKind::Cursor);

        let err = cursor.check::<()>(Err(status(WT_PANIC))).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Panic));
        assert!(conn.is_poisoned());
        assert_eq!(conn.ensure_live(), Err(err));
        assert!(!cursor.ancestors_live());
    }

    #[test]
    fn ordinary_errors_do_not_poison() {
        let conn = root();
        let err = conn.check::<()>(Err(status(WT_NOTFOUND))).unwrap_err();
        assert!(err.is_not_found());
        assert!(!conn.is_poisoned());
        assert_eq!(conn.check(Ok(7)), Ok(7));
    }
}
