//! # wiredbind core
//!
//! Safe handles over a native transactional cursor engine.
//!
//! This crate provides:
//! - [`Connection`], [`Session`] and [`Cursor`] wrappers that own one native
//!   handle each and release it exactly once
//! - Translation of native status codes into [`EngineError`]s with the
//!   engine's own descriptions
//! - Marshaling of keys, values, names and configuration strings
//! - Range counting over arbitrary key bounds ([`Cursor::total_count`])
//!
//! Closing a connection or session invalidates the handles opened from it;
//! using them afterwards returns [`CoreError::Closed`].
//!
//! ```rust
//! use wiredbind_core::{Connection, CursorConfig, ErrorKind};
//! use wiredbind_native::MemoryEngine;
//!
//! let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
//! let mut session = conn.open_session("").unwrap();
//! session.create("table:users", "key_format=u,value_format=u").unwrap();
//!
//! let mut cursor = session
//!     .open_cursor("table:users", CursorConfig::new().overwrite(false))
//!     .unwrap();
//! cursor.insert(b"alice", b"1").unwrap();
//! let err = cursor.insert(b"alice", b"2").unwrap_err();
//! assert_eq!(err.kind(), Some(ErrorKind::DuplicateKey));
//!
//! assert!(cursor.search(b"alice").unwrap());
//! assert_eq!(cursor.value().unwrap(), b"1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod connection;
mod cursor;
mod error;
mod handle;
mod marshal;
mod range;
mod session;

pub use config::{ConnectionConfig, CursorConfig, Isolation, SessionConfig, TransactionConfig};
pub use connection::Connection;
pub use cursor::{Cursor, NearMatch};
pub use error::{CoreError, CoreResult, EngineError, ErrorKind, ErrorTranslator};
pub use handle::HandleKind;
pub use marshal::{pack_index_key, split_index_key, ConfigArg};
pub use range::KeyBound;
pub use session::Session;
