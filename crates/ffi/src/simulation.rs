//! Commands that change the forest.
//!
//! Every function takes the write lock, returns a `ForestSimErrorCode` and
//! records failures for `forest_sim_get_last_error`.

use crate::error::{DefaultForestSimError, ForestSimErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, with_simulation_mut};
use crate::instance::ForestSimInstance;
use forest_fire_core::{ForestError, ForestGrid, ForestSimulation, Vec3};

fn with_grid_mut<F>(ptr: *const ForestSimInstance, f: F) -> ForestSimErrorCode
where
    F: FnOnce(&mut ForestGrid) -> Result<(), ForestError>,
{
    with_sim_mut(ptr, |sim| f(sim.grid_mut()))
}

fn with_sim_mut<F>(ptr: *const ForestSimInstance, f: F) -> ForestSimErrorCode
where
    F: FnOnce(&mut ForestSimulation) -> Result<(), ForestError>,
{
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        with_simulation_mut(instance, f)?.map_err(DefaultForestSimError::from)
    })
}

/// Advance the simulation by `dt` seconds of wall time.
///
/// Queued work is applied first; while running, one tick runs per elapsed
/// tick interval. The number of ticks run is written to `out_steps` when it is
/// non-null.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_steps` must be null or a valid pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn forest_sim_update(
    ptr: *const ForestSimInstance,
    dt: f32,
    out_steps: *mut u32,
) -> ForestSimErrorCode {
    let mut steps = 0;
    let code = with_sim_mut(ptr, |sim| {
        steps = sim.update(dt);
        Ok(())
    });
    if !out_steps.is_null() {
        unsafe {
            *out_steps = u32::try_from(steps).unwrap_or(u32::MAX);
        }
    }
    code
}

/// Run exactly one tick, whether or not the simulation is running.
#[no_mangle]
pub extern "C" fn forest_sim_step(ptr: *const ForestSimInstance) -> ForestSimErrorCode {
    with_sim_mut(ptr, |sim| {
        sim.step();
        Ok(())
    })
}

/// Play or pause the fixed-interval clock.
#[no_mangle]
pub extern "C" fn forest_sim_set_running(ptr: *const ForestSimInstance, running: bool) -> ForestSimErrorCode {
    with_sim_mut(ptr, |sim| {
        sim.set_running(running);
        Ok(())
    })
}

/// Set seconds of wall time per tick; must be finite and positive.
#[no_mangle]
pub extern "C" fn forest_sim_set_tick_interval(ptr: *const ForestSimInstance, seconds: f32) -> ForestSimErrorCode {
    with_sim_mut(ptr, |sim| sim.set_tick_interval(seconds))
}

/// Regenerate every chunk from freshly randomised noise.
#[no_mangle]
pub extern "C" fn forest_sim_generate(ptr: *const ForestSimInstance) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| {
        grid.generate();
        Ok(())
    })
}

/// Return every chunk to dormant.
#[no_mangle]
pub extern "C" fn forest_sim_clear(ptr: *const ForestSimInstance) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| {
        grid.clear();
        Ok(())
    })
}

/// Plant a tree at ground position `(x, y)` if the slot is empty.
#[no_mangle]
pub extern "C" fn forest_sim_add_tree(ptr: *const ForestSimInstance, x: f32, y: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.add_tree_at(&Vec3::new(x, y, 0.0)))
}

/// Remove the tree at ground position `(x, y)`.
#[no_mangle]
pub extern "C" fn forest_sim_remove_tree(ptr: *const ForestSimInstance, x: f32, y: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.remove_tree_at(&Vec3::new(x, y, 0.0)))
}

/// Set the growing tree at ground position `(x, y)` on fire.
#[no_mangle]
pub extern "C" fn forest_sim_ignite(ptr: *const ForestSimInstance, x: f32, y: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.ignite_at(&Vec3::new(x, y, 0.0)))
}

/// Put out fire at ground position `(x, y)` and, away from chunk edges,
/// around it.
#[no_mangle]
pub extern "C" fn forest_sim_extinguish(ptr: *const ForestSimInstance, x: f32, y: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.extinguish_at(&Vec3::new(x, y, 0.0)))
}

/// Try to start one fire per active chunk; the number started is written to
/// `out_started` when it is non-null.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_started` must be null or a valid pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn forest_sim_add_random_fire(
    ptr: *const ForestSimInstance,
    out_started: *mut usize,
) -> ForestSimErrorCode {
    let mut started = 0;
    let code = with_grid_mut(ptr, |grid| {
        started = grid.add_random_fire();
        Ok(())
    });
    if !out_started.is_null() {
        unsafe {
            *out_started = started;
        }
    }
    code
}

/// Set wind speed; must be finite and non-negative.
#[no_mangle]
pub extern "C" fn forest_sim_set_wind_speed(ptr: *const ForestSimInstance, speed: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.set_wind_speed(speed))
}

/// Set wind direction in radians (the direction the wind blows from).
#[no_mangle]
pub extern "C" fn forest_sim_set_wind_direction(ptr: *const ForestSimInstance, radians: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.set_wind_direction(radians))
}

/// Set the spread probability in `[0, 1]`.
#[no_mangle]
pub extern "C" fn forest_sim_set_fire_spread_speed(ptr: *const ForestSimInstance, probability: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.set_fire_spread_speed(probability))
}

/// Set the burn probability in `[0, 1]`.
#[no_mangle]
pub extern "C" fn forest_sim_set_burn_speed(ptr: *const ForestSimInstance, probability: f32) -> ForestSimErrorCode {
    with_grid_mut(ptr, |grid| grid.set_burn_speed(probability))
}

