//! # wiredbind native
//!
//! The native handle API that `wiredbind` binds to.
//!
//! This crate is the lowest layer of the workspace. It describes the storage
//! engine the way the engine exposes itself: three handle families
//! (connection, session, cursor) whose calls return integer status codes, plus
//! the process-level entry point that opens a connection.
//!
//! ## Design Principles
//!
//! - Every native call reports failure as a [`Status`] carrying the engine's
//!   integer code; success carries no code
//! - Keys and values are raw bytes; configuration strings are opaque text
//!   that only the engine interprets
//! - Data returned by a cursor aliases memory owned by that cursor and is
//!   only valid until the next call on it
//! - Connections are `Send + Sync`; sessions and cursors are `Send` only
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - ordered in-memory tables following the WiredTiger
//!   status-code and cursor contract
//!
//! ## Example
//!
//! ```rust
//! use wiredbind_native::{MemoryEngine, NativeEngine};
//!
//! let engine = MemoryEngine::new();
//! let conn = engine.open("db", Some("create")).unwrap();
//! let mut session = conn.open_session(None).unwrap();
//! session.create("table:t", None).unwrap();
//!
//! let mut cursor = session.open_cursor("table:t", None).unwrap();
//! cursor.set_key(b"k");
//! cursor.set_value(b"v");
//! cursor.insert().unwrap();
//!
//! cursor.set_key(b"k");
//! cursor.search().unwrap();
//! assert_eq!(cursor.get_value().unwrap(), b"v");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod memory;
mod status;

pub use api::{NativeConnection, NativeCursor, NativeEngine, NativeSession};
pub use memory::{ConfigReader, MemoryEngine};
pub use status::{
    strerror, NativeResult, Status, EBUSY, EEXIST, EINVAL, ENOENT, ENOTSUP, WT_CACHE_FULL,
    WT_DUPLICATE_KEY, WT_ERROR, WT_NOTFOUND, WT_PANIC, WT_PREPARE_CONFLICT, WT_RESTART,
    WT_ROLLBACK, WT_RUN_RECOVERY,
};
