//! Error codes and result types.

use std::cell::{Cell, RefCell};
use std::ffi::CString;
use wiredbind_core::{CoreError, ErrorKind};

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WbResult {
    /// Operation succeeded.
    Ok = 0,
    /// Generic engine error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Record or object not found.
    NotFound = 3,
    /// Transaction conflict; retry in a new transaction.
    Conflict = 4,
    /// The handle or one of its parents is closed.
    Closed = 5,
    /// Key already exists.
    DuplicateKey = 6,
    /// Cache budget exhausted.
    CacheFull = 7,
    /// The engine panicked; the connection must be discarded.
    Panic = 8,
    /// Null pointer.
    NullPointer = 9,
}

impl WbResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == WbResult::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != WbResult::Ok
    }
}

impl From<&CoreError> for WbResult {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::Engine(engine) => match engine.kind() {
                ErrorKind::NotFound => WbResult::NotFound,
                ErrorKind::Conflict => WbResult::Conflict,
                ErrorKind::DuplicateKey => WbResult::DuplicateKey,
                ErrorKind::CacheFull => WbResult::CacheFull,
                ErrorKind::Panic => WbResult::Panic,
                ErrorKind::Generic => WbResult::Error,
            },
            CoreError::Closed { .. } => WbResult::Closed,
            CoreError::InvalidArgument { .. } => WbResult::InvalidArgument,
        }
    }
}

// Thread-local storage for the last error
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static LAST_NATIVE_CODE: Cell<i32> = const { Cell::new(0) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error and native code.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
    LAST_NATIVE_CODE.with(|c| c.set(0));
}

/// Records `err` as the thread's last error and returns its result code.
pub fn report(err: &CoreError) -> WbResult {
    set_last_error(err.to_string());
    LAST_NATIVE_CODE.with(|c| c.set(err.native_code().unwrap_or(0)));
    WbResult::from(err)
}

/// Records a null pointer argument.
pub fn null_pointer(what: &str) -> WbResult {
    set_last_error(format!("null pointer argument: {what}"));
    WbResult::NullPointer
}

/// Records an invalid argument.
pub fn invalid_argument(message: impl Into<String>) -> WbResult {
    set_last_error(message);
    WbResult::InvalidArgument
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn wb_get_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Gets the native status code of the last error, or 0 if the last error
/// did not come from the engine.
#[no_mangle]
pub extern "C" fn wb_get_last_native_code() -> i32 {
    LAST_NATIVE_CODE.with(Cell::get)
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn wb_clear_error() {
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiredbind_core::{ErrorTranslator, HandleKind};
    use wiredbind_native::{MemoryEngine, WT_DUPLICATE_KEY};

    #[test]
    fn result_codes() {
        assert_eq!(WbResult::Ok as i32, 0);
        assert_eq!(WbResult::Error as i32, 1);
        assert!(WbResult::Ok.is_ok());
        assert!(WbResult::Error.is_err());
    }

    #[test]
    fn report_records_message_and_code() {
        clear_last_error();
        assert!(wb_get_last_error().is_null());
        assert_eq!(wb_get_last_native_code(), 0);

        let translator = ErrorTranslator::new(Arc::new(MemoryEngine::new()));
        let err = CoreError::from(translator.translate_code(WT_DUPLICATE_KEY));
        assert_eq!(report(&err), WbResult::DuplicateKey);
        assert_eq!(wb_get_last_native_code(), WT_DUPLICATE_KEY);

        let ptr = wb_get_last_error();
        assert!(!ptr.is_null());
        // Safety: we just set it
        let msg = unsafe { std::ffi::CStr::from_ptr(ptr) };
        assert!(msg.to_str().unwrap().starts_with("WiredTiger Error -31801 : ["));

        assert_eq!(report(&CoreError::closed(HandleKind::Cursor)), WbResult::Closed);
        assert_eq!(wb_get_last_native_code(), 0);

        clear_last_error();
        assert!(wb_get_last_error().is_null());
    }
}
