//! # wiredbind testkit
//!
//! Test utilities for wiredbind.
//!
//! This crate provides:
//! - Fixtures that open in-memory stores with a ready table
//! - Property-based test generators using proptest
//! - A reference range counter to check cursor counts against
//! - A fault-injecting engine for error-path tests
//! - Concurrent writer stress helpers
//! - `tracing` setup for test output
//!
//! ## Usage
//!
//! ```rust
//! use wiredbind_testkit::prelude::*;
//!
//! init_test_logging();
//! let mut store = TestStore::memory();
//! let mut cursor = store.cursor();
//! populate(&mut cursor, ["a", "b", "c"]);
//! assert_eq!(cursor.total_count(None, None).unwrap(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod oracle;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::oracle::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use oracle::*;
pub use stress::*;
