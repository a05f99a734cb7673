//! Cursor handle.

use crate::error::{CoreError, CoreResult};
use crate::handle::{HandleKind, Lineage};
use crate::marshal::{pack_index_key, require_bytes};
use std::fmt;
use tracing::warn;
use wiredbind_native::{NativeCursor, NativeResult, Status};

/// Where [`Cursor::search_near`] landed relative to the searched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearMatch {
    /// On the searched key.
    Exact,
    /// On the nearest smaller key.
    Smaller,
    /// On the nearest larger key.
    Larger,
}

impl From<i32> for NearMatch {
    fn from(exact: i32) -> Self {
        match exact {
            0 => Self::Exact,
            e if e < 0 => Self::Smaller,
            _ => Self::Larger,
        }
    }
}

/// Maps the native not-found status to `false`.
pub(crate) fn found(result: NativeResult<()>) -> NativeResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(status) if status.is_not_found() => Ok(false),
        Err(status) => Err(status),
    }
}

/// A positionable iterator over one data source.
///
/// Keys and values cross the binding as raw bytes. Records returned by
/// [`key`](Self::key), [`value`](Self::value) and [`current`](Self::current)
/// are copies; the engine's own buffers are only valid until the next
/// cursor call.
///
/// A cursor is positioned by a successful `search`, `search_near`, `next` or
/// `prev`, and becomes unpositioned after `reset`, `insert`, `remove` or
/// running off either end.
pub struct Cursor {
    native: Option<Box<dyn NativeCursor>>,
    lineage: Lineage,
    uri: String,
}

impl Cursor {
    pub(crate) fn new(native: Box<dyn NativeCursor>, lineage: Lineage) -> Self {
        let uri = native.uri().to_string();
        Self {
            native: Some(native),
            lineage,
            uri,
        }
    }

    pub(crate) fn with_native<T>(
        &mut self,
        f: impl FnOnce(&mut dyn NativeCursor) -> NativeResult<T>,
    ) -> CoreResult<T> {
        self.lineage.ensure_live()?;
        let native = self
            .native
            .as_deref_mut()
            .ok_or(CoreError::closed(HandleKind::Cursor))?;
        self.lineage.check(f(native))
    }

    /// The data source this cursor was opened on.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an empty key or value, and
    /// the engine error on failure, for example
    /// [`DuplicateKey`](crate::ErrorKind::DuplicateKey) when the key exists
    /// and the cursor was opened with `overwrite=false`.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let key = require_bytes("key", key)?;
        let value = require_bytes("value", value)?;
        self.with_native(|c| {
            c.set_key(key);
            c.set_value(value);
            c.insert()
        })
    }

    /// Inserts an index entry mapping `index_key` to `primary_key`.
    ///
    /// The stored key is [`pack_index_key`]`(index_key, primary_key)` and the
    /// stored value is the primary key, so entries with the same index key
    /// are kept apart and iterate in primary key order.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn insert_index(&mut self, index_key: &[u8], primary_key: &[u8]) -> CoreResult<()> {
        let index_key = require_bytes("index key", index_key)?;
        let primary_key = require_bytes("primary key", primary_key)?;
        let entry = pack_index_key(index_key, primary_key);
        self.insert(&entry, primary_key)
    }

    /// Removes the record with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an empty key. A missing key
    /// succeeds under the default configuration and returns a
    /// [`NotFound`](crate::ErrorKind::NotFound) engine error under
    /// `overwrite=false`.
    pub fn remove(&mut self, key: &[u8]) -> CoreResult<()> {
        let key = require_bytes("key", key)?;
        self.with_native(|c| {
            c.set_key(key);
            c.remove()
        })
    }

    /// Moves to the next record, or the first if unpositioned.
    ///
    /// Returns `false` when iteration is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the engine error on any other failure.
    pub fn next(&mut self) -> CoreResult<bool> {
        self.with_native(|c| found(c.next()))
    }

    /// Moves to the previous record, or the last if unpositioned.
    ///
    /// Returns `false` when iteration is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the engine error on any other failure.
    pub fn prev(&mut self) -> CoreResult<bool> {
        self.with_native(|c| found(c.prev()))
    }

    /// Releases the cursor's position.
    ///
    /// # Errors
    ///
    /// Returns the engine error on unexpected failure.
    pub fn reset(&mut self) -> CoreResult<()> {
        self.with_native(|c| c.reset())
    }

    /// Positions the cursor on `key`.
    ///
    /// Returns `false` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns the engine error on any other failure.
    pub fn search(&mut self, key: &[u8]) -> CoreResult<bool> {
        self.with_native(|c| {
            c.set_key(key);
            found(c.search())
        })
    }

    /// Positions the cursor on `key` or a neighbouring record.
    ///
    /// Returns `Some(0)` on an exact match, a negative value if the cursor
    /// landed on a smaller key, a positive value for a larger key and `None`
    /// if the data source is empty. [`NearMatch::from`] names the cases.
    ///
    /// # Errors
    ///
    /// Returns the engine error on any other failure.
    pub fn search_near(&mut self, key: &[u8]) -> CoreResult<Option<i32>> {
        self.with_native(|c| {
            c.set_key(key);
            match c.search_near() {
                Ok(exact) => Ok(Some(exact)),
                Err(status) if status.is_not_found() => Ok(None),
                Err(status) => Err(status),
            }
        })
    }

    /// Returns a copy of the current key.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the cursor is not positioned.
    pub fn key(&mut self) -> CoreResult<Vec<u8>> {
        self.with_native(|c| c.get_key().map(<[u8]>::to_vec))
    }

    /// Returns a copy of the current value.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the cursor is not positioned.
    pub fn value(&mut self) -> CoreResult<Vec<u8>> {
        self.with_native(|c| c.get_value().map(<[u8]>::to_vec))
    }

    /// Returns copies of the current key and value, or `None` if the cursor
    /// is not positioned.
    ///
    /// The engine reports an unpositioned cursor by failing the key read with
    /// `EINVAL`, so any `EINVAL` from that read is taken as "not positioned".
    /// Use [`key`](Self::key) to see the raw engine error instead.
    ///
    /// # Errors
    ///
    /// Returns the engine error for any other failure reading the key, or
    /// for any failure reading the value.
    pub fn current(&mut self) -> CoreResult<Option<(Vec<u8>, Vec<u8>)>> {
        self.with_native(|c| match c.get_key() {
            Ok(key) => {
                let key = key.to_vec();
                let value = c.get_value()?.to_vec();
                Ok(Some((key, value)))
            }
            Err(status) if status == Status::INVALID => Ok(None),
            Err(status) => Err(status),
        })
    }

    /// Returns true once the cursor, or one of its parents, has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.native.is_none() || self.lineage.ensure_live().is_err()
    }

    /// Closes the cursor. Closing twice is a no-op.
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
        if !self.lineage.ancestors_live() {
            // The session already released its cursors.
            return Ok(());
        }
        self.lineage.check(native.close())
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("uri", &self.uri)
            .field("is_closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(uri = %self.uri, error = %err, "failed to close cursor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::error::ErrorKind;
    use crate::marshal::split_index_key;
    use crate::session::Session;
    use wiredbind_native::MemoryEngine;

    fn is_send<T: Send>() {}

    fn open() -> (Connection, Session, Cursor) {
        let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
        let mut session = conn.open_session("").unwrap();
        session.create("table:t", "").unwrap();
        let cursor = session.open_cursor("table:t", "").unwrap();
        (conn, session, cursor)
    }

    #[test]
    fn cursor_is_send() {
        is_send::<Cursor>();
    }

    #[test]
    fn insert_search_round_trip() {
        let (_conn, _session, mut cursor) = open();
        cursor.insert(b"k", b"v").unwrap();

        assert!(cursor.search(b"k").unwrap());
        assert_eq!(cursor.key().unwrap(), b"k");
        assert_eq!(cursor.value().unwrap(), b"v");
        assert_eq!(cursor.current().unwrap(), Some((b"k".to_vec(), b"v".to_vec())));

        assert!(!cursor.search(b"missing").unwrap());
        assert_eq!(cursor.current().unwrap(), None);
    }

    #[test]
    fn empty_arguments_rejected() {
        let (_conn, _session, mut cursor) = open();
        assert!(matches!(
            cursor.insert(b"", b"v"),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(matches!(
            cursor.insert(b"k", b""),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(matches!(
            cursor.remove(b""),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn reset_twice_leaves_unpositioned() {
        let (_conn, _session, mut cursor) = open();
        cursor.insert(b"a", b"1").unwrap();
        assert!(cursor.next().unwrap());
        cursor.reset().unwrap();
        cursor.reset().unwrap();
        assert!(cursor.key().is_err());
        assert_eq!(cursor.current().unwrap(), None);
    }

    #[test]
    fn iteration_in_both_directions() {
        let (_conn, _session, mut cursor) = open();
        for key in [b"b", b"c", b"a"] {
            cursor.insert(key, b"v").unwrap();
        }

        let mut forward = Vec::new();
        while cursor.next().unwrap() {
            forward.push(cursor.key().unwrap());
        }
        assert_eq!(forward, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let mut backward = Vec::new();
        while cursor.prev().unwrap() {
            backward.push(cursor.key().unwrap());
        }
        assert_eq!(backward, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn search_near_between_keys() {
        let (_conn, _session, mut cursor) = open();
        assert_eq!(cursor.search_near(b"bb").unwrap(), None);

        cursor.insert(b"a", b"1").unwrap();
        cursor.insert(b"c", b"3").unwrap();

        let exact = cursor.search_near(b"bb").unwrap().unwrap();
        assert_ne!(exact, 0);
        let key = cursor.key().unwrap();
        match NearMatch::from(exact) {
            NearMatch::Larger => assert_eq!(key, b"c"),
            NearMatch::Smaller => assert_eq!(key, b"a"),
            NearMatch::Exact => unreachable!(),
        }
        let exact = cursor.search_near(b"c").unwrap().unwrap();
        assert_eq!(NearMatch::from(exact), NearMatch::Exact);
    }

    #[test]
    fn remove_missing_key() {
        let (_conn, mut session, mut cursor) = open();
        cursor.remove(b"missing").unwrap();

        let mut strict = session.open_cursor("table:t", "overwrite=false").unwrap();
        let err = strict.remove(b"missing").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn duplicate_key_under_no_overwrite() {
        let (_conn, mut session, mut cursor) = open();
        cursor.insert(b"k", b"1").unwrap();
        cursor.insert(b"k", b"2").unwrap();

        let mut strict = session
            .open_cursor("table:t", crate::CursorConfig::new().overwrite(false))
            .unwrap();
        let err = strict.insert(b"k", b"3").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::DuplicateKey));
    }

    #[test]
    fn index_entries_share_index_key() {
        let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
        let mut session = conn.open_session("").unwrap();
        session.create("index:t:by_name", "").unwrap();
        let mut cursor = session.open_cursor("index:t:by_name", "").unwrap();

        cursor.insert_index(b"smith", b"2").unwrap();
        cursor.insert_index(b"smith", b"1").unwrap();
        cursor.insert_index(b"jones", b"3").unwrap();

        let mut entries = Vec::new();
        while cursor.next().unwrap() {
            let (key, value) = cursor.current().unwrap().unwrap();
            let (index_key, primary_key) = split_index_key(&key).unwrap();
            assert_eq!(primary_key, value);
            entries.push((index_key, primary_key));
        }
        assert_eq!(
            entries,
            vec![
                (b"jones".to_vec(), b"3".to_vec()),
                (b"smith".to_vec(), b"1".to_vec()),
                (b"smith".to_vec(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn closed_session_invalidates_cursor() {
        let (_conn, mut session, mut cursor) = open();
        session.close().unwrap();
        assert!(cursor.is_closed());
        assert_eq!(cursor.next(), Err(CoreError::closed(HandleKind::Cursor)));
        cursor.close().unwrap();
        cursor.close().unwrap();
    }
}
