//! Engine FFI functions.

use crate::error::{clear_last_error, null_pointer, WbResult};
use crate::types::WbEngine;
use std::sync::Arc;
use wiredbind_native::{MemoryEngine, NativeEngine};

pub(crate) type EngineRef = Arc<dyn NativeEngine>;

/// Creates an in-memory engine.
///
/// # Safety
///
/// `out_engine` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn wb_engine_new_memory(out_engine: *mut *mut WbEngine) -> WbResult {
    clear_last_error();
    if out_engine.is_null() {
        return null_pointer("out_engine");
    }
    let engine: EngineRef = Arc::new(MemoryEngine::new());
    *out_engine = Box::into_raw(Box::new(engine)).cast::<WbEngine>();
    WbResult::Ok
}

/// Frees an engine handle.
///
/// Connections opened through the engine stay valid.
///
/// # Safety
///
/// `engine` must be null or a handle from `wb_engine_new_memory` that has
/// not been freed.
#[no_mangle]
pub unsafe extern "C" fn wb_engine_free(engine: *mut WbEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine.cast::<EngineRef>()));
    }
}

/// Borrows the engine behind a handle.
///
/// # Safety
///
/// `engine` must be a live engine handle.
pub(crate) unsafe fn engine_ref<'a>(engine: *const WbEngine) -> Result<&'a EngineRef, WbResult> {
    engine
        .cast::<EngineRef>()
        .as_ref()
        .ok_or_else(|| null_pointer("engine"))
}
