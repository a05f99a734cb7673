//! Connection FFI functions.

use crate::buffer::{opt_str_arg, str_arg, WbString};
use crate::engine::engine_ref;
use crate::error::{clear_last_error, invalid_argument, null_pointer, WbResult};
use crate::types::{WbConnection, WbEngine, WbSession};
use crate::{complete, handle_ref, write_out};
use std::ffi::c_char;
use std::sync::Arc;
use wiredbind_core::Connection;

/// Opens a connection.
///
/// # Arguments
///
/// * `engine` - Engine handle
/// * `home` - Store home (null-terminated UTF-8)
/// * `config` - Configuration string, or null
/// * `out_conn` - Output pointer for the connection handle
///
/// # Safety
///
/// - `engine` must be a live engine handle
/// - `home` must be a valid null-terminated UTF-8 string
/// - `config` must be null or a valid null-terminated UTF-8 string
/// - `out_conn` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn wb_connection_open(
    engine: *const WbEngine,
    home: *const c_char,
    config: *const c_char,
    out_conn: *mut *mut WbConnection,
) -> WbResult {
    clear_last_error();
    if out_conn.is_null() {
        return null_pointer("out_conn");
    }
    let engine = ffi_try!(engine_ref(engine));
    let home = ffi_try!(str_arg(home, "home"));
    let config = ffi_try!(opt_str_arg(config, "config"));

    complete(Connection::open_shared(Arc::clone(engine), home, config), |conn| {
        *out_conn = Box::into_raw(Box::new(conn)).cast::<WbConnection>();
    })
}

/// Closes a connection and frees its handle.
///
/// Sessions and cursors opened from it are invalidated but must still be
/// closed to free their handles.
///
/// # Safety
///
/// `conn` must be null or a live connection handle. It must not be used
/// after this call.
#[no_mangle]
pub unsafe extern "C" fn wb_connection_close(conn: *mut WbConnection) -> WbResult {
    clear_last_error();
    if conn.is_null() {
        return null_pointer("conn");
    }
    let mut conn = Box::from_raw(conn.cast::<Connection>());
    complete(conn.close(), |()| {})
}

/// Opens a session.
///
/// # Safety
///
/// - `conn` must be a live connection handle
/// - `config` must be null or a valid null-terminated UTF-8 string
/// - `out_session` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn wb_connection_open_session(
    conn: *const WbConnection,
    config: *const c_char,
    out_session: *mut *mut WbSession,
) -> WbResult {
    clear_last_error();
    if out_session.is_null() {
        return null_pointer("out_session");
    }
    let conn: &Connection = ffi_try!(handle_ref(conn, "conn"));
    let config = ffi_try!(opt_str_arg(config, "config"));
    complete(conn.open_session(config), |session| {
        *out_session = Box::into_raw(Box::new(session)).cast::<WbSession>();
    })
}

/// Reports whether opening the connection created the store.
///
/// # Safety
///
/// `conn` must be a live connection handle and `out_is_new` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_connection_is_new(
    conn: *const WbConnection,
    out_is_new: *mut bool,
) -> WbResult {
    clear_last_error();
    let conn: &Connection = ffi_try!(handle_ref(conn, "conn"));
    ffi_try!(write_out(out_is_new, conn.is_new(), "out_is_new"));
    WbResult::Ok
}

/// Returns the connection's home. Free it with `wb_free_string`.
///
/// # Safety
///
/// `conn` must be a live connection handle and `out_home` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_connection_home(
    conn: *const WbConnection,
    out_home: *mut WbString,
) -> WbResult {
    clear_last_error();
    if out_home.is_null() {
        return null_pointer("out_home");
    }
    let conn: &Connection = ffi_try!(handle_ref(conn, "conn"));
    let Some(home) = WbString::new(conn.home()) else {
        return invalid_argument("home contains a NUL byte");
    };
    out_home.write(home);
    WbResult::Ok
}

/// Waits for outstanding asynchronous operations.
///
/// # Safety
///
/// `conn` must be a live connection handle.
#[no_mangle]
pub unsafe extern "C" fn wb_connection_async_flush(conn: *const WbConnection) -> WbResult {
    clear_last_error();
    let conn: &Connection = ffi_try!(handle_ref(conn, "conn"));
    complete(conn.async_flush(), |()| {})
}

/// Applies a runtime configuration change.
///
/// # Safety
///
/// `conn` must be a live connection handle and `config` null or a valid
/// null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn wb_connection_reconfigure(
    conn: *const WbConnection,
    config: *const c_char,
) -> WbResult {
    clear_last_error();
    let conn: &Connection = ffi_try!(handle_ref(conn, "conn"));
    let config = ffi_try!(opt_str_arg(config, "config"));
    complete(conn.reconfigure(config), |()| {})
}
