//! Type definitions for FFI.

/// An opaque engine handle.
///
/// Never dereference or modify directly.
#[repr(C)]
pub struct WbEngine {
    _private: [u8; 0],
}

/// An opaque connection handle.
#[repr(C)]
pub struct WbConnection {
    _private: [u8; 0],
}

/// An opaque session handle.
#[repr(C)]
pub struct WbSession {
    _private: [u8; 0],
}

/// An opaque cursor handle.
#[repr(C)]
pub struct WbCursor {
    _private: [u8; 0],
}

/// One edge of a key range for `wb_cursor_total_count`.
///
/// Pass a null pointer instead of a bound for an unbounded side. A bound
/// with zero length is also unbounded.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WbKeyBound {
    /// Pointer to the key bytes.
    pub data: *const u8,
    /// Key length in bytes.
    pub len: usize,
    /// Whether the key itself is in range.
    pub inclusive: bool,
}
