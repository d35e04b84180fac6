use forest_fire_core::{ForestConfig, ForestGrid, ForestRenderCache, ForestSimulation, TerrainData};
use std::ptr;
use std::sync::{Mutex, RwLock};
use tracing::info;

use crate::error::{DefaultForestSimError, ForestSimErrorCode};
use crate::helpers::{track_error, track_result};
use crate::terrain::{ForestSimConfig, Terrain};

/// The forest simulation context handed to hosts as an opaque pointer.
///
/// # Thread Safety
/// The core simulation is single-threaded; this wrapper provides the external
/// mutual exclusion it needs. The simulation sits behind an `RwLock`, so
/// queries from render or worker threads share a read lock while commands and
/// `forest_sim_update` take the write lock.
///
/// # Usage in Game Engines
/// ```cpp
/// ForestSimInstance* Forest = nullptr;
///
/// void AForestActor::BeginPlay() {
///     Terrain terrain = make_flat_terrain(1024.0f, 1024.0f, 4.0f, 0.0f);
///     ForestSimConfig config = forest_sim_default_config();
///     if (forest_sim_new(terrain, &config, &Forest) != ForestSimErrorCode::Ok) {
///         UE_LOG(LogTemp, Error, TEXT("%s"), UTF8_TO_TCHAR(forest_sim_get_last_error()));
///         return;
///     }
///     forest_sim_generate(Forest);
///     forest_sim_set_running(Forest, true);
/// }
///
/// void AForestActor::Tick(float DeltaTime) {
///     uint32_t steps = 0;
///     forest_sim_update(Forest, DeltaTime, &steps);
/// }
///
/// void AForestActor::EndPlay(const EEndPlayReason::Type) {
///     forest_sim_destroy(Forest);
///     Forest = nullptr;
/// }
/// ```
pub struct ForestSimInstance {
    pub(crate) sim: RwLock<ForestSimulation>,
    /// Elevation used to place tree instances.
    pub(crate) terrain: TerrainData,
    /// Instance buffers reused across `forest_sim_copy_chunk_*` calls.
    pub(crate) render_cache: Mutex<ForestRenderCache>,
}

impl ForestSimInstance {
    /// Creates a dormant forest sized to the terrain.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTerrainParameters` for unusable terrain, `NullPointer`
    /// for a null heightmap and `InvalidParameter` for a rejected config.
    ///
    /// # Safety
    /// See [`Terrain::to_terrain_data`].
    pub(crate) unsafe fn new(terrain: &Terrain, config: ForestConfig) -> Result<Box<Self>, DefaultForestSimError> {
        let terrain = unsafe { terrain.to_terrain_data()? };
        let grid = ForestGrid::from_terrain(&terrain, config)?;
        let (width, height) = grid.dimensions();
        info!(
            "Created FFI forest instance: {}x{} chunks over {}x{} terrain",
            width,
            height,
            terrain.width(),
            terrain.depth()
        );

        Ok(Box::new(Self {
            sim: RwLock::new(ForestSimulation::new(grid)),
            terrain,
            render_cache: Mutex::new(ForestRenderCache::new()),
        }))
    }
}

/// Create a new forest instance and return it via out-parameter.
///
/// The forest starts dormant and paused; call `forest_sim_generate` and
/// `forest_sim_set_running` to populate and start it.
///
/// Parameters
/// - `terrain`: landscape description; heightmap data is copied.
/// - `config`: tunables, or null for `forest_sim_default_config()`.
/// - `out_instance`: receives the instance on success, null on failure.
///
/// Returns
/// - `ForestSimErrorCode::Ok` (0) on success
/// - `ForestSimErrorCode::NullPointer` if `out_instance` or the heightmap is null
/// - `ForestSimErrorCode::InvalidTerrainParameters` for unusable terrain
/// - `ForestSimErrorCode::InvalidParameter` for a rejected config or a terrain
///   smaller than one chunk
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - `config` must be null or point to a valid `ForestSimConfig`.
/// - The caller owns the returned instance and MUST call `forest_sim_destroy`
///   exactly once.
#[no_mangle]
pub unsafe extern "C" fn forest_sim_new(
    terrain: Terrain,
    config: *const ForestSimConfig,
    out_instance: *mut *mut ForestSimInstance,
) -> ForestSimErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_instance"));
    }

    // SAFETY: caller guarantees `config` is null or valid.
    let config = unsafe { config.as_ref() }.copied().unwrap_or_default();

    match track_result(unsafe { ForestSimInstance::new(&terrain, config.into()) }) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            ForestSimErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroys an instance previously created by `forest_sim_new`.
///
/// Null is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `forest_sim_new` and not freed already.
/// - The caller must not use the pointer afterwards.
#[no_mangle]
pub unsafe extern "C" fn forest_sim_destroy(ptr: *mut ForestSimInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: `ptr` came from `Box::into_raw` in `forest_sim_new`.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
