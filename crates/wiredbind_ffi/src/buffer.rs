//! Buffer types for FFI.

use crate::error::{invalid_argument, null_pointer, WbResult};
use std::ffi::{c_char, CStr, CString};

/// A byte buffer for FFI.
///
/// Memory is owned by Rust. Call `wb_free_buffer` to release.
#[repr(C)]
pub struct WbBuffer {
    /// Pointer to data.
    pub data: *mut u8,
    /// Length in bytes.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
}

impl WbBuffer {
    /// Creates a new buffer from a Vec.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = vec.into_boxed_slice();
        let data = vec.as_mut_ptr();
        let len = vec.len();
        std::mem::forget(vec);

        Self {
            data,
            len,
            capacity: len,
        }
    }

    /// Creates an empty buffer.
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    /// Returns true if the buffer is null/empty.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts back to a Vec, consuming the buffer.
    ///
    /// # Safety
    ///
    /// The buffer must have been created by [`WbBuffer::from_vec`].
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.data.is_null() {
            return Vec::new();
        }
        Vec::from_raw_parts(self.data, self.len, self.capacity)
    }
}

/// Frees a buffer allocated by wiredbind.
///
/// # Safety
///
/// The buffer must have been returned by a wiredbind FFI function and not
/// freed before.
#[no_mangle]
pub unsafe extern "C" fn wb_free_buffer(buffer: WbBuffer) {
    drop(buffer.into_vec());
}

/// A string for FFI.
///
/// Null-terminated UTF-8 string. Memory owned by Rust.
/// Call `wb_free_string` to release.
#[repr(C)]
pub struct WbString {
    /// Pointer to null-terminated string.
    pub ptr: *mut c_char,
    /// Length (not including null terminator).
    pub len: usize,
}

impl WbString {
    /// Creates a new FFI string from a Rust string.
    ///
    /// Returns `None` if `s` contains a NUL byte.
    pub fn new(s: &str) -> Option<Self> {
        let cstring = CString::new(s).ok()?;
        let len = cstring.as_bytes().len();
        let ptr = cstring.into_raw();

        Some(Self { ptr, len })
    }

    /// Creates an empty string.
    pub fn empty() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    /// Returns true if the string is null.
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

/// Frees a string allocated by wiredbind.
///
/// # Safety
///
/// The string must have been returned by a wiredbind FFI function and not
/// freed before.
#[no_mangle]
pub unsafe extern "C" fn wb_free_string(string: WbString) {
    if !string.ptr.is_null() {
        drop(CString::from_raw(string.ptr));
    }
}

/// Borrows a caller byte buffer. A null pointer is only accepted with a
/// zero length, and reads as an empty slice.
///
/// # Safety
///
/// `data` must be null or point to `len` readable bytes that stay valid for
/// `'a`.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, what: &str) -> Result<&'a [u8], WbResult> {
    if data.is_null() {
        if len == 0 {
            Ok(&[])
        } else {
            Err(null_pointer(what))
        }
    } else {
        Ok(std::slice::from_raw_parts(data, len))
    }
}

/// Borrows a required caller string.
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated string that stays valid
/// for `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, WbResult> {
    match opt_str_arg(ptr, what)? {
        Some(s) => Ok(s),
        None => Err(null_pointer(what)),
    }
}

/// Borrows an optional caller string; null reads as `None`.
///
/// # Safety
///
/// Same as [`str_arg`].
pub(crate) unsafe fn opt_str_arg<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, WbResult> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|_| invalid_argument(format!("invalid UTF-8 in {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_round_trip() {
        let buffer = WbBuffer::from_vec(vec![1, 2, 3]);
        assert!(!buffer.is_null());
        assert_eq!(buffer.len, 3);
        // Safety: created from a Vec above
        let back = unsafe { buffer.into_vec() };
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn empty_buffer() {
        let buffer = WbBuffer::empty();
        assert!(buffer.is_null());
        // Safety: freeing an empty buffer is a no-op
        unsafe { wb_free_buffer(buffer) };
    }

    #[test]
    fn string_round_trip() {
        let s = WbString::new("table:t").unwrap();
        assert_eq!(s.len, 7);
        // Safety: created above
        let text = unsafe { CStr::from_ptr(s.ptr) }.to_str().unwrap().to_string();
        assert_eq!(text, "table:t");
        // Safety: created above and freed once
        unsafe { wb_free_string(s) };
        assert!(WbString::new("a\0b").is_none());
        assert!(WbString::empty().is_null());
    }

    #[test]
    fn argument_helpers() {
        // Safety: null with zero length is allowed
        assert_eq!(unsafe { bytes_arg(std::ptr::null(), 0, "key") }, Ok(&[][..]));
        assert_eq!(
            unsafe { bytes_arg(std::ptr::null(), 3, "key") },
            Err(WbResult::NullPointer)
        );
        let data = [1u8, 2];
        // Safety: data outlives the slice
        assert_eq!(unsafe { bytes_arg(data.as_ptr(), 2, "key") }, Ok(&data[..]));

        let name = CString::new("table:t").unwrap();
        // Safety: name outlives the borrow
        assert_eq!(unsafe { str_arg(name.as_ptr(), "name") }, Ok("table:t"));
        assert_eq!(
            unsafe { str_arg(std::ptr::null(), "name") },
            Err(WbResult::NullPointer)
        );
        assert_eq!(unsafe { opt_str_arg(std::ptr::null(), "config") }, Ok(None));
    }
}
