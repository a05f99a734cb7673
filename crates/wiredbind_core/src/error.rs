//! Error types and native status translation.

use crate::handle::HandleKind;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use wiredbind_native::{
    NativeEngine, Status, WT_CACHE_FULL, WT_DUPLICATE_KEY, WT_NOTFOUND, WT_PANIC,
    WT_PREPARE_CONFLICT, WT_ROLLBACK, WT_RUN_RECOVERY,
};

/// Result type for binding operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Classification of a native status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested record or object does not exist.
    NotFound,
    /// The operation conflicted with another transaction and was rolled back.
    Conflict,
    /// An insert found an existing key under `overwrite=false`.
    DuplicateKey,
    /// The in-memory cache budget is exhausted.
    CacheFull,
    /// The engine cannot continue; the connection must be discarded.
    Panic,
    /// Any other failure.
    Generic,
}

impl ErrorKind {
    /// Classifies a native status code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            WT_NOTFOUND => Self::NotFound,
            WT_ROLLBACK | WT_PREPARE_CONFLICT => Self::Conflict,
            WT_DUPLICATE_KEY => Self::DuplicateKey,
            WT_CACHE_FULL => Self::CacheFull,
            WT_PANIC | WT_RUN_RECOVERY => Self::Panic,
            _ => Self::Generic,
        }
    }

    /// Returns true if repeating the operation in a new transaction may
    /// succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict | Self::CacheFull)
    }

    /// Returns true if the connection that produced the error is unusable.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Panic)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::DuplicateKey => "duplicate key",
            Self::CacheFull => "cache full",
            Self::Panic => "panic",
            Self::Generic => "error",
        };
        f.write_str(name)
    }
}

/// A failed native call, with the engine's own description of the code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{engine} Error {code} : [{description}]")]
pub struct EngineError {
    engine: &'static str,
    code: i32,
    description: String,
    kind: ErrorKind,
}

impl EngineError {
    /// The name of the engine that produced the code.
    #[must_use]
    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// The native status code.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The engine's description of the code.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The classification of the code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Turns native status codes into [`EngineError`]s.
///
/// Descriptions come from the engine that returned the code, so a
/// translator is bound to one engine and shared by every handle opened
/// through it.
#[derive(Clone)]
pub struct ErrorTranslator {
    engine: Arc<dyn NativeEngine>,
}

impl ErrorTranslator {
    /// Creates a translator for `engine`.
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self { engine }
    }

    /// The engine this translator describes.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }

    /// Translates a raw status code.
    #[must_use]
    pub fn translate_code(&self, code: i32) -> EngineError {
        EngineError {
            engine: self.engine.name(),
            code,
            description: self.engine.strerror(code).into_owned(),
            kind: ErrorKind::from_code(code),
        }
    }

    /// Translates a native status.
    #[must_use]
    pub fn translate(&self, status: Status) -> EngineError {
        self.translate_code(status.code())
    }
}

impl fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTranslator")
            .field("engine", &self.engine.name())
            .finish()
    }
}

/// Errors returned by the binding layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A native call failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The handle, or one of its parents, has been closed.
    #[error("{handle} is closed")]
    Closed {
        /// The kind of handle that was used.
        handle: HandleKind,
    },

    /// An argument was rejected before reaching the engine.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a closed-handle error.
    pub fn closed(handle: HandleKind) -> Self {
        Self::Closed { handle }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// The engine error, if this error came from a native call.
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }

    /// The classification of the native code, if any.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.engine_error().map(EngineError::kind)
    }

    /// The native status code, if any.
    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        self.engine_error().map(EngineError::code)
    }

    /// Returns true for a native not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// Returns true if repeating the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_retryable)
    }
}
