//! Native status codes.
//!
//! The engine reports every outcome as an integer: `0` for success, one of
//! the reserved negative codes below for engine-specific failures, and a
//! POSIX errno value for everything else.

use std::borrow::Cow;
use std::io;
use thiserror::Error;

/// Conflict between concurrent operations.
pub const WT_ROLLBACK: i32 = -31800;
/// Attempt to insert an existing key.
pub const WT_DUPLICATE_KEY: i32 = -31801;
/// Non-specific engine error.
pub const WT_ERROR: i32 = -31802;
/// Item not found.
pub const WT_NOTFOUND: i32 = -31803;
/// Engine panic; the connection is unusable.
pub const WT_PANIC: i32 = -31804;
/// Restart the operation (internal).
pub const WT_RESTART: i32 = -31805;
/// Recovery must be run to continue.
pub const WT_RUN_RECOVERY: i32 = -31806;
/// Operation would overflow an in-memory cache.
pub const WT_CACHE_FULL: i32 = -31807;
/// Conflict with a prepared update.
pub const WT_PREPARE_CONFLICT: i32 = -31808;

/// No such file or directory.
pub const ENOENT: i32 = 2;
/// Device or resource busy.
pub const EBUSY: i32 = 16;
/// File exists.
pub const EEXIST: i32 = 17;
/// Invalid argument.
pub const EINVAL: i32 = 22;
/// Operation not supported.
pub const ENOTSUP: i32 = 95;

/// Result of a native call.
pub type NativeResult<T> = Result<T, Status>;

/// A non-zero status returned by a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("native status {0}")]
pub struct Status(i32);

impl Status {
    /// Item not found.
    pub const NOT_FOUND: Status = Status(WT_NOTFOUND);
    /// Attempt to insert an existing key.
    pub const DUPLICATE_KEY: Status = Status(WT_DUPLICATE_KEY);
    /// Conflict between concurrent operations.
    pub const ROLLBACK: Status = Status(WT_ROLLBACK);
    /// Operation would overflow cache.
    pub const CACHE_FULL: Status = Status(WT_CACHE_FULL);
    /// Invalid argument.
    pub const INVALID: Status = Status(EINVAL);
    /// No such file or directory.
    pub const NO_ENTRY: Status = Status(ENOENT);
    /// Resource busy.
    pub const BUSY: Status = Status(EBUSY);
    /// Already exists.
    pub const EXISTS: Status = Status(EEXIST);

    /// Wraps a raw status code.
    ///
    /// Returns `None` for `0`, which is success rather than a status.
    #[must_use]
    pub const fn new(code: i32) -> Option<Self> {
        if code == 0 {
            None
        } else {
            Some(Self(code))
        }
    }

    /// Converts a raw return value into a result.
    pub const fn check(code: i32) -> NativeResult<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Self(code))
        }
    }

    /// Returns the raw status code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Returns true if this is the engine's "item not found" status.
    #[must_use]
    pub const fn is_not_found(self) -> bool {
        self.0 == WT_NOTFOUND
    }
}

/// Returns the engine's description of a status code.
///
/// Reserved engine codes have fixed descriptions; anything else is looked up
/// as an OS error number.
#[must_use]
pub fn strerror(code: i32) -> Cow<'static, str> {
    let text = match code {
        0 => "Successful return: 0",
        WT_ROLLBACK => "WT_ROLLBACK: conflict between concurrent operations",
        WT_DUPLICATE_KEY => "WT_DUPLICATE_KEY: attempt to insert an existing key",
        WT_ERROR => "WT_ERROR: non-specific WiredTiger error",
        WT_NOTFOUND => "WT_NOTFOUND: item not found",
        WT_PANIC => "WT_PANIC: WiredTiger library panic",
        WT_RESTART => "WT_RESTART: restart the operation (internal)",
        WT_RUN_RECOVERY => "WT_RUN_RECOVERY: recovery must be run to continue",
        WT_CACHE_FULL => "WT_CACHE_FULL: operation would overflow cache",
        WT_PREPARE_CONFLICT => "WT_PREPARE_CONFLICT: conflict with a prepared update",
        c if c > 0 => return Cow::Owned(os_error_text(c)),
        c => return Cow::Owned(format!("Unknown error: {c}")),
    };
    Cow::Borrowed(text)
}

fn os_error_text(code: i32) -> String {
    let mut text = io::Error::from_raw_os_error(code).to_string();
    // std appends " (os error N)"; the engine text does not carry it.
    if let Some(idx) = text.find(" (os error") {
        text.truncate(idx);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_status() {
        assert!(Status::new(0).is_none());
        assert!(Status::check(0).is_ok());
        assert_eq!(Status::check(WT_NOTFOUND), Err(Status::NOT_FOUND));
    }

    #[test]
    fn not_found_detection() {
        assert!(Status::NOT_FOUND.is_not_found());
        assert!(!Status::DUPLICATE_KEY.is_not_found());
        assert_eq!(Status::new(EINVAL).map(Status::code), Some(EINVAL));
    }

    #[test]
    fn reserved_descriptions() {
        assert_eq!(
            strerror(WT_DUPLICATE_KEY),
            "WT_DUPLICATE_KEY: attempt to insert an existing key"
        );
        assert_eq!(strerror(WT_NOTFOUND), "WT_NOTFOUND: item not found");
        assert_eq!(strerror(WT_CACHE_FULL), "WT_CACHE_FULL: operation would overflow cache");
    }

    #[test]
    fn errno_descriptions_drop_os_suffix() {
        let text = strerror(ENOENT);
        assert!(!text.is_empty());
        assert!(!text.contains("os error"));
    }

    #[test]
    fn unknown_negative_code() {
        assert_eq!(strerror(-5), "Unknown error: -5");
    }
}
