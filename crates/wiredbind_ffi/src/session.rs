//! Session FFI functions.

use crate::buffer::{opt_str_arg, str_arg};
use crate::error::{clear_last_error, null_pointer, WbResult};
use crate::types::{WbCursor, WbSession};
use crate::{complete, handle_mut, handle_ref, write_out};
use std::ffi::c_char;
use wiredbind_core::Session;

/// Closes a session and frees its handle.
///
/// A running transaction is rolled back. Cursors opened from the session
/// are invalidated but must still be closed to free their handles.
///
/// # Safety
///
/// `session` must be null or a live session handle. It must not be used
/// after this call.
#[no_mangle]
pub unsafe extern "C" fn wb_session_close(session: *mut WbSession) -> WbResult {
    clear_last_error();
    if session.is_null() {
        return null_pointer("session");
    }
    let mut session = Box::from_raw(session.cast::<Session>());
    complete(session.close(), |()| {})
}

macro_rules! session_config_call {
    ($(#[$doc:meta])* $name:ident => $method:ident) => {
        $(#[$doc])*
        ///
        /// # Safety
        ///
        /// `session` must be a live session handle and `config` null or a
        /// valid null-terminated UTF-8 string.
        #[no_mangle]
        pub unsafe extern "C" fn $name(session: *mut WbSession, config: *const c_char) -> WbResult {
            clear_last_error();
            let session: &mut Session = ffi_try!(handle_mut(session, "session"));
            let config = ffi_try!(opt_str_arg(config, "config"));
            complete(session.$method(config), |()| {})
        }
    };
}

session_config_call!(
    /// Starts a transaction.
    wb_session_begin_transaction => begin_transaction
);
session_config_call!(
    /// Commits the running transaction.
    wb_session_commit_transaction => commit_transaction
);
session_config_call!(
    /// Rolls back the running transaction.
    wb_session_rollback_transaction => rollback_transaction
);
session_config_call!(
    /// Writes a checkpoint.
    wb_session_checkpoint => checkpoint
);

/// Reports whether the session has a running transaction.
///
/// # Safety
///
/// `session` must be a live session handle and `out_active` a valid
/// pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_session_in_transaction(
    session: *const WbSession,
    out_active: *mut bool,
) -> WbResult {
    clear_last_error();
    let session: &Session = ffi_try!(handle_ref(session, "session"));
    ffi_try!(write_out(out_active, session.in_transaction(), "out_active"));
    WbResult::Ok
}

/// Creates a data source.
///
/// # Safety
///
/// `session` must be a live session handle, `name` a valid null-terminated
/// UTF-8 string and `config` null or one.
#[no_mangle]
pub unsafe extern "C" fn wb_session_create(
    session: *mut WbSession,
    name: *const c_char,
    config: *const c_char,
) -> WbResult {
    clear_last_error();
    let session: &mut Session = ffi_try!(handle_mut(session, "session"));
    let name = ffi_try!(str_arg(name, "name"));
    let config = ffi_try!(opt_str_arg(config, "config"));
    complete(session.create(name, config), |()| {})
}

/// Drops a data source.
///
/// # Safety
///
/// Same as `wb_session_create`.
#[no_mangle]
pub unsafe extern "C" fn wb_session_drop(
    session: *mut WbSession,
    name: *const c_char,
    config: *const c_char,
) -> WbResult {
    clear_last_error();
    let session: &mut Session = ffi_try!(handle_mut(session, "session"));
    let name = ffi_try!(str_arg(name, "name"));
    let config = ffi_try!(opt_str_arg(config, "config"));
    complete(session.drop_with(name, config), |()| {})
}

/// Compacts a data source.
///
/// # Safety
///
/// `session` must be a live session handle and `name` a valid
/// null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn wb_session_compact(session: *mut WbSession, name: *const c_char) -> WbResult {
    clear_last_error();
    let session: &mut Session = ffi_try!(handle_mut(session, "session"));
    let name = ffi_try!(str_arg(name, "name"));
    complete(session.compact(name), |()| {})
}

/// Renames a data source.
///
/// # Safety
///
/// `session` must be a live session handle and both names valid
/// null-terminated UTF-8 strings.
#[no_mangle]
pub unsafe extern "C" fn wb_session_rename(
    session: *mut WbSession,
    old_name: *const c_char,
    new_name: *const c_char,
) -> WbResult {
    clear_last_error();
    let session: &mut Session = ffi_try!(handle_mut(session, "session"));
    let old_name = ffi_try!(str_arg(old_name, "old_name"));
    let new_name = ffi_try!(str_arg(new_name, "new_name"));
    complete(session.rename(old_name, new_name), |()| {})
}

/// Opens a cursor.
///
/// # Safety
///
/// `session` must be a live session handle, `name` a valid null-terminated
/// UTF-8 string, `config` null or one, and `out_cursor` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_session_open_cursor(
    session: *mut WbSession,
    name: *const c_char,
    config: *const c_char,
    out_cursor: *mut *mut WbCursor,
) -> WbResult {
    clear_last_error();
    if out_cursor.is_null() {
        return null_pointer("out_cursor");
    }
    let session: &mut Session = ffi_try!(handle_mut(session, "session"));
    let name = ffi_try!(str_arg(name, "name"));
    let config = ffi_try!(opt_str_arg(config, "config"));
    complete(session.open_cursor(name, config), |cursor| {
        *out_cursor = Box::into_raw(Box::new(cursor)).cast::<WbCursor>();
    })
}
