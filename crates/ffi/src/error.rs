use forest_fire_core::ForestError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - the error code returned across the FFI boundary
/// - `msg()` - the message stored for `forest_sim_get_last_error`
pub(crate) trait ForestSimError {
    fn code(&self) -> ForestSimErrorCode;

    fn msg(&self) -> &str;
}

/// Default implementation of `ForestSimError` for FFI failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultForestSimError {
    code: ForestSimErrorCode,
    msg: String,
}

impl DefaultForestSimError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: ForestSimErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: ForestSimErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid terrain parameters with a custom message.
    pub fn invalid_terrain_parameter_msg(param_name: &str, message: &str) -> Self {
        Self {
            code: ForestSimErrorCode::InvalidTerrainParameters,
            msg: format!("Terrain parameter {param_name}: {message}"),
        }
    }

    /// Create error for a non-finite or non-positive terrain extent.
    pub fn invalid_terrain_parameter(param_name: &str, value: f32) -> Self {
        Self::invalid_terrain_parameter_msg(param_name, &format!("must be finite and positive, got {value}"))
    }

    /// Create error for invalid parameter.
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: ForestSimErrorCode::InvalidParameter,
            msg: message,
        }
    }

    /// Create error for a caller buffer that cannot hold the result.
    pub fn buffer_too_small(required: usize, capacity: usize) -> Self {
        Self {
            code: ForestSimErrorCode::BufferTooSmall,
            msg: format!("Buffer holds {capacity} instances, {required} required"),
        }
    }
}

impl ForestSimError for DefaultForestSimError {
    fn code(&self) -> ForestSimErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<ForestError> for DefaultForestSimError {
    fn from(error: ForestError) -> Self {
        let code = match error {
            ForestError::CoordinateOutOfRange { .. } => ForestSimErrorCode::CoordinateOutOfRange,
            ForestError::ChunkNotActive { .. } => ForestSimErrorCode::ChunkNotActive,
            ForestError::InvalidParameter(_) => ForestSimErrorCode::InvalidParameter,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

/// FFI error codes returned by forest simulation functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestSimErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Invalid terrain parameters: extents, resolution or heightmap dimensions.
    InvalidTerrainParameters = 3,

    /// Invalid parameter passed to function.
    InvalidParameter = 4,

    /// World position outside the forest.
    CoordinateOutOfRange = 5,

    /// Target chunk has not been generated.
    ChunkNotActive = 6,

    /// Caller-provided buffer is too small.
    BufferTooSmall = 7,
}

impl From<DefaultForestSimError> for ForestSimErrorCode {
    fn from(error: DefaultForestSimError) -> Self {
        error.code
    }
}

thread_local! {
    /// Most recent FFI error on this thread (C string, error code).
    /// The `CString` is kept here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, ForestSimErrorCode)> = const { RefCell::new((None, ForestSimErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, ForestSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, ForestSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call on this thread succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// ForestSimErrorCode err = forest_sim_ignite(sim, 12.0f, 40.0f);
/// if (err != ForestSimErrorCode::Ok) {
///     const char* error = forest_sim_get_last_error();
///     if (error) {
///         printf("Ignite failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn forest_sim_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code (`Ok` if the last call succeeded).
#[no_mangle]
pub extern "C" fn forest_sim_get_last_error_code() -> ForestSimErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
