//! Native handle traits.

use crate::status::{strerror, NativeResult};
use std::borrow::Cow;
use std::cmp::Ordering;

/// The process-level entry point of a storage engine.
///
/// An engine opens connections against a home location. It also owns the
/// mapping from status codes to descriptions, so error messages always come
/// from the engine that produced the code.
pub trait NativeEngine: Send + Sync {
    /// Short engine name used in error messages.
    fn name(&self) -> &'static str {
        "WiredTiger"
    }

    /// Returns the description of a status code.
    fn strerror(&self, code: i32) -> Cow<'static, str> {
        strerror(code)
    }

    /// Opens (or creates, depending on `config`) the store at `home`.
    ///
    /// `config` is passed through verbatim; `None` is the native null
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns the native status if the store cannot be opened.
    fn open(&self, home: &str, config: Option<&str>) -> NativeResult<Box<dyn NativeConnection>>;
}

/// A native connection handle.
///
/// Connections may be shared between threads; the engine synchronises
/// access internally.
pub trait NativeConnection: Send + Sync {
    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn open_session(&self, config: Option<&str>) -> NativeResult<Box<dyn NativeSession>>;

    /// Returns true if opening this connection created the store.
    fn is_new(&self) -> bool;

    /// Returns the home the connection was opened with.
    fn home(&self) -> &str;

    /// Waits for outstanding asynchronous operations to drain.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn async_flush(&self) -> NativeResult<()>;

    /// Applies a runtime configuration change.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn reconfigure(&self, config: Option<&str>) -> NativeResult<()>;

    /// Closes the connection.
    ///
    /// Closing a connection closes every session and cursor opened from it
    /// and rolls back their active transactions.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure. The handle is released either
    /// way.
    fn close(self: Box<Self>, config: Option<&str>) -> NativeResult<()>;
}

/// A native session handle.
///
/// A session must only be used by one thread at a time.
pub trait NativeSession: Send {
    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Fails if a transaction is already running.
    fn begin_transaction(&mut self, config: Option<&str>) -> NativeResult<()>;

    /// Commits the running transaction.
    ///
    /// # Errors
    ///
    /// Fails if no transaction is running.
    fn commit_transaction(&mut self, config: Option<&str>) -> NativeResult<()>;

    /// Rolls back the running transaction.
    ///
    /// # Errors
    ///
    /// Fails if no transaction is running.
    fn rollback_transaction(&mut self, config: Option<&str>) -> NativeResult<()>;

    /// Writes a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn checkpoint(&mut self, config: Option<&str>) -> NativeResult<()>;

    /// Compacts a data source.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn compact(&mut self, name: &str, config: Option<&str>) -> NativeResult<()>;

    /// Creates a data source.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn create(&mut self, name: &str, config: Option<&str>) -> NativeResult<()>;

    /// Drops a data source.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn drop_object(&mut self, name: &str, config: Option<&str>) -> NativeResult<()>;

    /// Renames a data source.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn rename(&mut self, old_name: &str, new_name: &str, config: Option<&str>)
        -> NativeResult<()>;

    /// Opens a cursor over a data source.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn open_cursor(&mut self, uri: &str, config: Option<&str>)
        -> NativeResult<Box<dyn NativeCursor>>;

    /// Closes the session, rolling back any running transaction.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure. The handle is released either
    /// way.
    fn close(self: Box<Self>, config: Option<&str>) -> NativeResult<()>;
}

/// A native cursor handle in raw (untyped bytes) mode.
///
/// Keys and values are staged with [`set_key`](Self::set_key) and
/// [`set_value`](Self::set_value) before the call that consumes them. Views
/// returned by [`get_key`](Self::get_key) and [`get_value`](Self::get_value)
/// borrow cursor-owned memory and end at the next call on the cursor.
pub trait NativeCursor: Send {
    /// The data source this cursor was opened on.
    fn uri(&self) -> &str;

    /// Stages the key for the next operation.
    fn set_key(&mut self, key: &[u8]);

    /// Stages the value for the next operation.
    fn set_value(&mut self, value: &[u8]);

    /// Returns the key of the current record.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is not positioned.
    fn get_key(&self) -> NativeResult<&[u8]>;

    /// Returns the value of the current record.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is not positioned.
    fn get_value(&self) -> NativeResult<&[u8]>;

    /// Compares the current key against `other` in the data source's order.
    ///
    /// The default is byte-lexicographic order; engines with custom collators
    /// override it.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is not positioned.
    fn compare_key(&self, other: &[u8]) -> NativeResult<Ordering> {
        Ok(self.get_key()?.cmp(other))
    }

    /// Moves to the next record. An unpositioned cursor moves to the first.
    ///
    /// # Errors
    ///
    /// Returns `WT_NOTFOUND` when iteration is exhausted.
    fn next(&mut self) -> NativeResult<()>;

    /// Moves to the previous record. An unpositioned cursor moves to the last.
    ///
    /// # Errors
    ///
    /// Returns `WT_NOTFOUND` when iteration is exhausted.
    fn prev(&mut self) -> NativeResult<()>;

    /// Releases the cursor's position.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure.
    fn reset(&mut self) -> NativeResult<()>;

    /// Positions on the record matching the staged key.
    ///
    /// # Errors
    ///
    /// Returns `WT_NOTFOUND` when no record matches.
    fn search(&mut self) -> NativeResult<()>;

    /// Positions on the staged key or a logically adjacent record.
    ///
    /// Returns `0` for an exact match, a negative value when the cursor
    /// landed on a smaller key and a positive value for a larger key.
    ///
    /// # Errors
    ///
    /// Returns `WT_NOTFOUND` when the data source is empty.
    fn search_near(&mut self) -> NativeResult<i32>;

    /// Inserts the staged key and value.
    ///
    /// # Errors
    ///
    /// Returns `WT_DUPLICATE_KEY` when the key exists and the cursor does not
    /// overwrite.
    fn insert(&mut self) -> NativeResult<()>;

    /// Removes the record with the staged key.
    ///
    /// # Errors
    ///
    /// Returns `WT_NOTFOUND` when the key is absent and the cursor does not
    /// overwrite.
    fn remove(&mut self) -> NativeResult<()>;

    /// Closes the cursor.
    ///
    /// # Errors
    ///
    /// Returns the native status on failure. The handle is released either
    /// way.
    fn close(self: Box<Self>) -> NativeResult<()>;
}
