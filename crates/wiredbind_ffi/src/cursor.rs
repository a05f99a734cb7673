//! Cursor FFI functions.

use crate::buffer::{bytes_arg, WbBuffer};
use crate::error::{clear_last_error, null_pointer, WbResult};
use crate::types::{WbCursor, WbKeyBound};
use crate::{complete, handle_mut};
use wiredbind_core::{Cursor, KeyBound};

/// Closes a cursor and frees its handle.
///
/// # Safety
///
/// `cursor` must be null or a live cursor handle. It must not be used after
/// this call.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_close(cursor: *mut WbCursor) -> WbResult {
    clear_last_error();
    if cursor.is_null() {
        return null_pointer("cursor");
    }
    let mut cursor = Box::from_raw(cursor.cast::<Cursor>());
    complete(cursor.close(), |()| {})
}

/// Inserts a record.
///
/// # Safety
///
/// `cursor` must be a live cursor handle; `key` and `value` must point to
/// `key_len` and `value_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_insert(
    cursor: *mut WbCursor,
    key: *const u8,
    key_len: usize,
    value: *const u8,
    value_len: usize,
) -> WbResult {
    clear_last_error();
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let key = ffi_try!(bytes_arg(key, key_len, "key"));
    let value = ffi_try!(bytes_arg(value, value_len, "value"));
    complete(cursor.insert(key, value), |()| {})
}

/// Inserts an index entry for `index_key` pointing at `primary_key`.
///
/// # Safety
///
/// Same as `wb_cursor_insert`.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_insert_index(
    cursor: *mut WbCursor,
    index_key: *const u8,
    index_key_len: usize,
    primary_key: *const u8,
    primary_key_len: usize,
) -> WbResult {
    clear_last_error();
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let index_key = ffi_try!(bytes_arg(index_key, index_key_len, "index_key"));
    let primary_key = ffi_try!(bytes_arg(primary_key, primary_key_len, "primary_key"));
    complete(cursor.insert_index(index_key, primary_key), |()| {})
}

/// Removes a record.
///
/// # Safety
///
/// `cursor` must be a live cursor handle and `key` must point to `key_len`
/// readable bytes.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_remove(
    cursor: *mut WbCursor,
    key: *const u8,
    key_len: usize,
) -> WbResult {
    clear_last_error();
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let key = ffi_try!(bytes_arg(key, key_len, "key"));
    complete(cursor.remove(key), |()| {})
}

/// Releases the cursor's position.
///
/// # Safety
///
/// `cursor` must be a live cursor handle.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_reset(cursor: *mut WbCursor) -> WbResult {
    clear_last_error();
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    complete(cursor.reset(), |()| {})
}

/// Moves to the next record. `out_found` is false when iteration is
/// exhausted.
///
/// # Safety
///
/// `cursor` must be a live cursor handle and `out_found` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_next(cursor: *mut WbCursor, out_found: *mut bool) -> WbResult {
    clear_last_error();
    if out_found.is_null() {
        return null_pointer("out_found");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    complete(cursor.next(), |found| *out_found = found)
}

/// Moves to the previous record. `out_found` is false when iteration is
/// exhausted.
///
/// # Safety
///
/// `cursor` must be a live cursor handle and `out_found` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_prev(cursor: *mut WbCursor, out_found: *mut bool) -> WbResult {
    clear_last_error();
    if out_found.is_null() {
        return null_pointer("out_found");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    complete(cursor.prev(), |found| *out_found = found)
}

/// Positions the cursor on `key`. `out_found` is false if the key does not
/// exist.
///
/// # Safety
///
/// `cursor` must be a live cursor handle, `key` must point to `key_len`
/// readable bytes and `out_found` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_search(
    cursor: *mut WbCursor,
    key: *const u8,
    key_len: usize,
    out_found: *mut bool,
) -> WbResult {
    clear_last_error();
    if out_found.is_null() {
        return null_pointer("out_found");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let key = ffi_try!(bytes_arg(key, key_len, "key"));
    complete(cursor.search(key), |found| *out_found = found)
}

/// Positions the cursor on `key` or a neighbouring record.
///
/// `out_found` is false if the data source is empty. Otherwise `out_exact`
/// is 0 for an exact match, negative for a smaller key and positive for a
/// larger key.
///
/// # Safety
///
/// `cursor` must be a live cursor handle, `key` must point to `key_len`
/// readable bytes and both output pointers must be valid.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_search_near(
    cursor: *mut WbCursor,
    key: *const u8,
    key_len: usize,
    out_exact: *mut i32,
    out_found: *mut bool,
) -> WbResult {
    clear_last_error();
    if out_exact.is_null() || out_found.is_null() {
        return null_pointer("out_exact/out_found");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let key = ffi_try!(bytes_arg(key, key_len, "key"));
    complete(cursor.search_near(key), |near| {
        *out_found = near.is_some();
        *out_exact = near.unwrap_or(0);
    })
}

/// Copies the current key. Free it with `wb_free_buffer`.
///
/// # Safety
///
/// `cursor` must be a live cursor handle and `out_key` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_get_key(cursor: *mut WbCursor, out_key: *mut WbBuffer) -> WbResult {
    clear_last_error();
    if out_key.is_null() {
        return null_pointer("out_key");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    complete(cursor.key(), |key| out_key.write(WbBuffer::from_vec(key)))
}

/// Copies the current value. Free it with `wb_free_buffer`.
///
/// # Safety
///
/// `cursor` must be a live cursor handle and `out_value` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_get_value(
    cursor: *mut WbCursor,
    out_value: *mut WbBuffer,
) -> WbResult {
    clear_last_error();
    if out_value.is_null() {
        return null_pointer("out_value");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    complete(cursor.value(), |value| out_value.write(WbBuffer::from_vec(value)))
}

/// Borrows an optional range bound.
///
/// # Safety
///
/// `bound` must be null or point to a valid `WbKeyBound` whose key stays
/// readable for `'a`.
unsafe fn key_bound_arg<'a>(bound: *const WbKeyBound, what: &str) -> Result<Option<KeyBound<'a>>, WbResult> {
    let Some(bound) = bound.as_ref() else {
        return Ok(None);
    };
    let key = bytes_arg(bound.data, bound.len, what)?;
    Ok(Some(if bound.inclusive {
        KeyBound::inclusive(key)
    } else {
        KeyBound::exclusive(key)
    }))
}

/// Counts the records between two bounds. A null bound, or one with zero
/// length, leaves that side unbounded. The cursor is reset afterwards.
///
/// # Safety
///
/// `cursor` must be a live cursor handle, each bound null or valid, and
/// `out_count` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_cursor_total_count(
    cursor: *mut WbCursor,
    left: *const WbKeyBound,
    right: *const WbKeyBound,
    out_count: *mut u64,
) -> WbResult {
    clear_last_error();
    if out_count.is_null() {
        return null_pointer("out_count");
    }
    let cursor: &mut Cursor = ffi_try!(handle_mut(cursor, "cursor"));
    let left = ffi_try!(key_bound_arg(left, "left"));
    let right = ffi_try!(key_bound_arg(right, "right"));
    complete(cursor.total_count(left, right), |count| *out_count = count)
}
