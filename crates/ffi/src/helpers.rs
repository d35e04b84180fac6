use crate::error::{with_last_error_mut, DefaultForestSimError, ForestSimError, ForestSimErrorCode};
use crate::instance::ForestSimInstance;
use forest_fire_core::ForestSimulation;
use std::ffi::CString;
use tracing::debug;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl ForestSimError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Record an error and return its code.
#[inline]
pub(crate) fn track_error(error: &impl ForestSimError) -> ForestSimErrorCode {
    debug!("FFI call failed: {}", error.msg());
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = ForestSimErrorCode::Ok;
    });
}

/// Record the outcome of a fallible call; errors become their code.
pub(crate) fn track_result<T>(result: Result<T, DefaultForestSimError>) -> Result<T, ForestSimErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(e) => Err(track_error(&e)),
    }
}

/// Run an FFI body and collapse its result into an error code.
pub(crate) fn handle_ffi_result_error<F>(body: F) -> ForestSimErrorCode
where
    F: FnOnce() -> Result<(), DefaultForestSimError>,
{
    match track_result(body()) {
        Ok(()) => ForestSimErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow the instance behind a pointer handed out by `forest_sim_new`.
pub(crate) fn instance_from_ptr<'a>(ptr: *const ForestSimInstance) -> Result<&'a ForestSimInstance, DefaultForestSimError> {
    // SAFETY: callers promise `ptr` is null or a live pointer from `forest_sim_new`.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultForestSimError::null_pointer("ptr"))
}

/// Run `f` under the simulation's read lock.
pub(crate) fn with_simulation<F, R>(instance: &ForestSimInstance, f: F) -> Result<R, DefaultForestSimError>
where
    F: FnOnce(&ForestSimulation) -> R,
{
    let sim = instance
        .sim
        .read()
        .map_err(|_| DefaultForestSimError::lock_poisoned("RwLock"))?;
    Ok(f(&sim))
}

/// Run `f` under the simulation's write lock.
pub(crate) fn with_simulation_mut<F, R>(instance: &ForestSimInstance, f: F) -> Result<R, DefaultForestSimError>
where
    F: FnOnce(&mut ForestSimulation) -> R,
{
    let mut sim = instance
        .sim
        .write()
        .map_err(|_| DefaultForestSimError::lock_poisoned("RwLock"))?;
    Ok(f(&mut sim))
}
