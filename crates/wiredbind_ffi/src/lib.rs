//! # wiredbind FFI
//!
//! Stable C ABI for wiredbind host bindings.
//!
//! This crate provides:
//! - C-compatible function exports for engines, connections, sessions and
//!   cursors
//! - Memory ownership conventions: buffers and strings returned to the
//!   caller are owned by Rust and released with `wb_free_buffer` and
//!   `wb_free_string`
//! - Error code mapping, with the last error message and native status code
//!   kept per thread
//!
//! Every `*_close` function consumes its handle. Closing a parent leaves
//! child handles valid to close, but any other call on them returns
//! `WbResult::Closed`.

#![warn(missing_docs)]

/// Unwraps an argument conversion or returns its error code.
macro_rules! ffi_try {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(code) => return code,
        }
    };
}

pub mod buffer;
pub mod connection;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod session;
pub mod types;

pub use buffer::*;
pub use connection::*;
pub use cursor::*;
pub use engine::*;
pub use error::*;
pub use session::*;
pub use types::*;

use wiredbind_core::CoreResult;

/// Maps a binding result to a result code, recording the error.
pub(crate) fn complete<T>(result: CoreResult<T>, on_ok: impl FnOnce(T)) -> WbResult {
    match result {
        Ok(value) => {
            on_ok(value);
            WbResult::Ok
        }
        Err(err) => error::report(&err),
    }
}

/// Borrows the Rust value behind an opaque handle.
///
/// # Safety
///
/// `handle` must be null or a live handle created from a `Box<T>`.
pub(crate) unsafe fn handle_ref<'a, H, T>(handle: *const H, what: &str) -> Result<&'a T, WbResult> {
    handle
        .cast::<T>()
        .as_ref()
        .ok_or_else(|| error::null_pointer(what))
}

/// Mutably borrows the Rust value behind an opaque handle.
///
/// # Safety
///
/// Same as [`handle_ref`], and no other borrow of the handle may be live.
pub(crate) unsafe fn handle_mut<'a, H, T>(handle: *mut H, what: &str) -> Result<&'a mut T, WbResult> {
    handle
        .cast::<T>()
        .as_mut()
        .ok_or_else(|| error::null_pointer(what))
}

/// Writes `value` through an output pointer.
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T, what: &str) -> Result<(), WbResult> {
    if out.is_null() {
        return Err(error::null_pointer(what));
    }
    out.write(value);
    Ok(())
}
