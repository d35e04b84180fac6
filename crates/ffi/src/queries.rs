//! Read-only queries and render buffer export.

use forest_fire_core::{Chunk, ChunkCoord, ChunkInstanceBuffers, ForestStats, Vec3};
use std::ptr;

use crate::error::{DefaultForestSimError, ForestSimErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_simulation};
use crate::instance::ForestSimInstance;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// FFI-friendly snapshot of forest-wide counts.
/// Keep this layout stable for C/C++/C# consumers.
pub struct ForestSimStats {
    /// Chunks that have been generated.
    pub active_chunks: usize,
    /// Growing trees.
    pub alive: usize,
    /// Burning trees.
    pub burning: usize,
    /// Burned-out trees.
    pub burned: usize,
    /// Ticks run since creation.
    pub ticks: u64,
    /// Whether the fixed-interval clock is running.
    pub running: bool,
}

impl ForestSimStats {
    fn new(stats: ForestStats, running: bool) -> Self {
        Self {
            active_chunks: stats.active_chunks,
            alive: stats.alive,
            burning: stats.burning,
            burned: stats.burned,
            ticks: stats.ticks,
            running,
        }
    }
}

fn chunk_outside(cx: i32, cy: i32) -> DefaultForestSimError {
    DefaultForestSimError::invalid_parameter(format!("Chunk ({cx}, {cy}) is outside the forest"))
}

#[no_mangle]
/// Grid size in chunks and the chunk side length in cells.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - All out-parameters must be valid, non-null pointers.
pub unsafe extern "C" fn forest_sim_get_dimensions(
    ptr: *const ForestSimInstance,
    out_width: *mut usize,
    out_height: *mut usize,
    out_chunk_size: *mut usize,
) -> ForestSimErrorCode {
    if out_width.is_null() || out_height.is_null() || out_chunk_size.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_width/out_height/out_chunk_size"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let ((width, height), chunk_size) = with_simulation(instance, |sim| {
            (sim.grid().dimensions(), sim.grid().chunk_size())
        })?;
        unsafe {
            *out_width = width;
            *out_height = height;
            *out_chunk_size = chunk_size;
        }
        Ok(())
    })
}

#[no_mangle]
/// Fill `out_stats` with forest-wide counts.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_stats` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_get_stats(
    ptr: *const ForestSimInstance,
    out_stats: *mut ForestSimStats,
) -> ForestSimErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_stats"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let stats = with_simulation(instance, |sim| ForestSimStats::new(sim.grid().stats(), sim.is_running()))?;
        unsafe {
            *out_stats = stats;
        }
        Ok(())
    })
}

#[no_mangle]
/// Raw cell value at ground position `(x, y)`: 0 empty, 1-63 growing,
/// 64-254 burning, 255 burned.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_value` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_get_cell(
    ptr: *const ForestSimInstance,
    x: f32,
    y: f32,
    out_value: *mut u8,
) -> ForestSimErrorCode {
    if out_value.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_value"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let cell = with_simulation(instance, |sim| sim.grid().cell_at(&Vec3::new(x, y, 0.0)))??;
        unsafe {
            *out_value = cell.raw();
        }
        Ok(())
    })
}

#[no_mangle]
/// Current wind: speed, direction in radians and its unit vector.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - All out-parameters must be valid, non-null pointers.
pub unsafe extern "C" fn forest_sim_get_wind(
    ptr: *const ForestSimInstance,
    out_speed: *mut f32,
    out_direction: *mut f32,
    out_dir_x: *mut f32,
    out_dir_y: *mut f32,
) -> ForestSimErrorCode {
    if out_speed.is_null() || out_direction.is_null() || out_dir_x.is_null() || out_dir_y.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_speed/out_direction/out_dir_x/out_dir_y"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let (speed, direction, vector) = with_simulation(instance, |sim| {
            let wind = sim.grid().wind();
            (wind.speed(), wind.direction(), wind.direction_vector())
        })?;
        unsafe {
            *out_speed = speed;
            *out_direction = direction;
            *out_dir_x = vector.x;
            *out_dir_y = vector.y;
        }
        Ok(())
    })
}

#[no_mangle]
/// Terrain elevation at ground position `(x, y)`.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_elevation` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_get_elevation(
    ptr: *const ForestSimInstance,
    x: f32,
    y: f32,
    out_elevation: *mut f32,
) -> ForestSimErrorCode {
    if out_elevation.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_elevation"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        unsafe {
            *out_elevation = instance.terrain.elevation_at(x, y);
        }
        Ok(())
    })
}

#[no_mangle]
/// Number of trees (any state) in chunk `(cx, cy)`; 0 for dormant chunks.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_count` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_get_chunk_tree_count(
    ptr: *const ForestSimInstance,
    cx: i32,
    cy: i32,
    out_count: *mut usize,
) -> ForestSimErrorCode {
    if out_count.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_count"));
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let count = with_simulation(instance, |sim| {
            sim.grid().chunk(ChunkCoord::new(cx, cy)).map(Chunk::tree_count)
        })?
        .ok_or_else(|| chunk_outside(cx, cy))?;
        unsafe {
            *out_count = count;
        }
        Ok(())
    })
}

/// Shared body of the chunk buffer copies.
///
/// `select` picks the flat float view and `stride` its floats per instance.
unsafe fn copy_chunk_buffer<F>(
    ptr: *const ForestSimInstance,
    coord: ChunkCoord,
    out_buffer: *mut f32,
    capacity: usize,
    out_written: *mut usize,
    stride: usize,
    select: F,
) -> ForestSimErrorCode
where
    F: Fn(&ChunkInstanceBuffers) -> &[f32],
{
    if out_written.is_null() {
        return track_error(&DefaultForestSimError::null_pointer("out_written"));
    }
    unsafe {
        *out_written = 0;
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let mut cache = instance
            .render_cache
            .lock()
            .map_err(|_| DefaultForestSimError::lock_poisoned("Mutex"))?;

        with_simulation(instance, |sim| {
            let buffers = cache
                .sync_chunk(sim.grid(), coord, &instance.terrain)
                .ok_or_else(|| chunk_outside(coord.x, coord.y))?;
            let data = select(buffers);
            let count = data.len() / stride;
            unsafe {
                *out_written = count;
            }
            if count > capacity {
                return Err(DefaultForestSimError::buffer_too_small(count, capacity));
            }
            if count > 0 {
                if out_buffer.is_null() {
                    return Err(DefaultForestSimError::null_pointer("out_buffer"));
                }
                // SAFETY: caller guarantees room for `capacity * stride` floats.
                unsafe {
                    ptr::copy_nonoverlapping(data.as_ptr(), out_buffer, data.len());
                }
            }
            Ok(())
        })?
    })
}

#[no_mangle]
/// Copy the world positions of every tree in chunk `(cx, cy)`.
///
/// Each instance is four floats `(x, y, z, 1)`, z from the terrain, in cell
/// order (x outer, y inner). `out_written` receives the instance count; when
/// it exceeds `capacity` nothing is copied and `BufferTooSmall` is returned,
/// so callers can size the buffer and retry.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_positions` must point to at least `capacity * 4` writable floats
///   (may be null when `capacity` is 0).
/// - `out_written` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_copy_chunk_positions(
    ptr: *const ForestSimInstance,
    cx: i32,
    cy: i32,
    out_positions: *mut f32,
    capacity: usize,
    out_written: *mut usize,
) -> ForestSimErrorCode {
    unsafe {
        copy_chunk_buffer(ptr, ChunkCoord::new(cx, cy), out_positions, capacity, out_written, 4, |b| {
            b.positions().as_flattened()
        })
    }
}

#[no_mangle]
/// Copy the colours of every tree in chunk `(cx, cy)`, three floats (RGB)
/// per instance in the same order as `forest_sim_copy_chunk_positions`.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `forest_sim_new`.
/// - `out_colors` must point to at least `capacity * 3` writable floats
///   (may be null when `capacity` is 0).
/// - `out_written` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_sim_copy_chunk_colors(
    ptr: *const ForestSimInstance,
    cx: i32,
    cy: i32,
    out_colors: *mut f32,
    capacity: usize,
    out_written: *mut usize,
) -> ForestSimErrorCode {
    unsafe {
        copy_chunk_buffer(ptr, ChunkCoord::new(cx, cy), out_colors, capacity, out_written, 3, |b| {
            b.colors().as_flattened()
        })
    }
}
