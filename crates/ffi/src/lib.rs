//! C ABI for embedding the forest fire simulation in game engines.
//!
//! Hosts create an opaque [`ForestSimInstance`] from a [`Terrain`] and a
//! [`ForestSimConfig`], drive it with `forest_sim_update` every frame, issue
//! commands from input handlers and copy per-chunk instance buffers for
//! rendering. Every fallible call returns a [`ForestSimErrorCode`] and leaves
//! a message for `forest_sim_get_last_error` on the calling thread.

mod error;
mod helpers;
mod instance;
mod queries;
mod simulation;
mod terrain;

pub use error::{forest_sim_get_last_error, forest_sim_get_last_error_code, ForestSimErrorCode};
pub use instance::{forest_sim_destroy, forest_sim_new, ForestSimInstance};
pub use queries::{
    forest_sim_copy_chunk_colors, forest_sim_copy_chunk_positions, forest_sim_get_cell,
    forest_sim_get_chunk_tree_count, forest_sim_get_dimensions, forest_sim_get_elevation, forest_sim_get_stats,
    forest_sim_get_wind, ForestSimStats,
};
pub use simulation::{
    forest_sim_add_random_fire, forest_sim_add_tree, forest_sim_clear, forest_sim_extinguish, forest_sim_generate,
    forest_sim_ignite, forest_sim_remove_tree, forest_sim_set_burn_speed, forest_sim_set_fire_spread_speed,
    forest_sim_set_running, forest_sim_set_tick_interval, forest_sim_set_wind_direction, forest_sim_set_wind_speed,
    forest_sim_step, forest_sim_update,
};
pub use terrain::{forest_sim_default_config, ForestSimConfig, Terrain};

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    fn flat_terrain() -> Terrain {
        Terrain::Flat {
            width: 16.0,
            depth: 8.0,
            resolution: 1.0,
            base_elevation: 2.0,
        }
    }

    fn config() -> ForestSimConfig {
        ForestSimConfig {
            chunk_size: 8,
            seed: 17,
            use_seed: true,
            ..forest_sim_default_config()
        }
    }

    fn new_instance() -> *mut ForestSimInstance {
        let mut instance = ptr::null_mut();
        let code = unsafe { forest_sim_new(flat_terrain(), &config(), &mut instance) };
        assert_eq!(code, ForestSimErrorCode::Ok);
        assert!(!instance.is_null());
        instance
    }

    fn stats(instance: *const ForestSimInstance) -> ForestSimStats {
        let mut stats = ForestSimStats::default();
        assert_eq!(unsafe { forest_sim_get_stats(instance, &mut stats) }, ForestSimErrorCode::Ok);
        stats
    }

    #[test]
    fn test_create_and_query_dimensions() {
        let instance = new_instance();
        let (mut w, mut h, mut size) = (0, 0, 0);
        let code = unsafe { forest_sim_get_dimensions(instance, &mut w, &mut h, &mut size) };
        assert_eq!(code, ForestSimErrorCode::Ok);
        assert_eq!((w, h, size), (2, 1, 8));

        let mut elevation = 0.0;
        assert_eq!(
            unsafe { forest_sim_get_elevation(instance, 3.0, 3.0, &mut elevation) },
            ForestSimErrorCode::Ok
        );
        assert_eq!(elevation, 2.0);

        unsafe { forest_sim_destroy(instance) };
    }

    #[test]
    fn test_invalid_creation_reports_error() {
        let mut instance = ptr::null_mut();
        let terrain = Terrain::Flat {
            width: -1.0,
            depth: 8.0,
            resolution: 1.0,
            base_elevation: 0.0,
        };
        let code = unsafe { forest_sim_new(terrain, ptr::null(), &mut instance) };
        assert_eq!(code, ForestSimErrorCode::InvalidTerrainParameters);
        assert!(instance.is_null());
        assert_eq!(forest_sim_get_last_error_code(), ForestSimErrorCode::InvalidTerrainParameters);
        let msg = unsafe { CStr::from_ptr(forest_sim_get_last_error()) };
        assert!(msg.to_string_lossy().contains("width"));

        let code = unsafe { forest_sim_new(flat_terrain(), ptr::null(), ptr::null_mut()) };
        assert_eq!(code, ForestSimErrorCode::NullPointer);
    }

    #[test]
    fn test_commands_before_generate() {
        let instance = new_instance();
        assert_eq!(forest_sim_ignite(instance, 1.0, 1.0), ForestSimErrorCode::ChunkNotActive);
        assert_eq!(forest_sim_add_tree(instance, 100.0, 1.0), ForestSimErrorCode::CoordinateOutOfRange);
        assert_eq!(forest_sim_set_wind_speed(instance, -1.0), ForestSimErrorCode::InvalidParameter);
        assert_eq!(forest_sim_step(ptr::null()), ForestSimErrorCode::NullPointer);

        // A successful call clears the last error
        assert_eq!(forest_sim_set_wind_speed(instance, 2.0), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_get_last_error_code(), ForestSimErrorCode::Ok);
        assert!(forest_sim_get_last_error().is_null());

        unsafe { forest_sim_destroy(instance) };
    }

    #[test]
    fn test_point_edits_and_ticks() {
        let instance = new_instance();
        assert_eq!(forest_sim_generate(instance), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_remove_tree(instance, 4.5, 4.5), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_add_tree(instance, 4.5, 4.5), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_ignite(instance, 4.5, 4.5), ForestSimErrorCode::Ok);

        let mut value = 0;
        assert_eq!(unsafe { forest_sim_get_cell(instance, 4.5, 4.5, &mut value) }, ForestSimErrorCode::Ok);
        assert_eq!(value, 64);

        assert_eq!(forest_sim_extinguish(instance, 4.5, 4.5), ForestSimErrorCode::Ok);
        assert_eq!(unsafe { forest_sim_get_cell(instance, 4.5, 4.5, &mut value) }, ForestSimErrorCode::Ok);
        assert_eq!(value, 1);

        assert_eq!(forest_sim_set_running(instance, true), ForestSimErrorCode::Ok);
        let mut steps = 0;
        let tick = config().tick_interval;
        assert_eq!(
            unsafe { forest_sim_update(instance, tick * 3.5, &mut steps) },
            ForestSimErrorCode::Ok
        );
        assert_eq!(steps, 3);
        assert_eq!(forest_sim_step(instance), ForestSimErrorCode::Ok);

        let snapshot = stats(instance);
        assert_eq!(snapshot.ticks, 4);
        assert_eq!(snapshot.active_chunks, 2);
        assert!(snapshot.running);

        assert_eq!(forest_sim_clear(instance), ForestSimErrorCode::Ok);
        assert_eq!(stats(instance).active_chunks, 0);

        unsafe { forest_sim_destroy(instance) };
    }

    #[test]
    fn test_copy_chunk_buffers() {
        let instance = new_instance();
        assert_eq!(forest_sim_generate(instance), ForestSimErrorCode::Ok);

        let mut count = 0;
        assert_eq!(
            unsafe { forest_sim_get_chunk_tree_count(instance, 1, 0, &mut count) },
            ForestSimErrorCode::Ok
        );

        // Size query with an empty buffer
        let mut written = 0;
        let code = unsafe { forest_sim_copy_chunk_positions(instance, 1, 0, ptr::null_mut(), 0, &mut written) };
        assert_eq!(written, count);
        if count > 0 {
            assert_eq!(code, ForestSimErrorCode::BufferTooSmall);
        }

        let mut positions = vec![0.0_f32; count * 4];
        let code =
            unsafe { forest_sim_copy_chunk_positions(instance, 1, 0, positions.as_mut_ptr(), count, &mut written) };
        assert_eq!(code, ForestSimErrorCode::Ok);
        assert_eq!(written, count);
        for p in positions.chunks_exact(4) {
            assert!((8.0..16.0).contains(&p[0]));
            assert!((0.0..8.0).contains(&p[1]));
            assert_eq!(p[2], 2.0);
            assert_eq!(p[3], 1.0);
        }

        let mut colors = vec![0.0_f32; count * 3];
        let code = unsafe { forest_sim_copy_chunk_colors(instance, 1, 0, colors.as_mut_ptr(), count, &mut written) };
        assert_eq!(code, ForestSimErrorCode::Ok);
        assert!(colors.chunks_exact(3).all(|c| c == [0.0, 0.8, 0.0]));

        let code = unsafe { forest_sim_copy_chunk_colors(instance, 5, 0, colors.as_mut_ptr(), count, &mut written) };
        assert_eq!(code, ForestSimErrorCode::InvalidParameter);

        unsafe { forest_sim_destroy(instance) };
    }

    #[test]
    fn test_random_fire_and_wind_query() {
        let instance = new_instance();
        assert_eq!(forest_sim_generate(instance), ForestSimErrorCode::Ok);

        let mut started = usize::MAX;
        assert_eq!(
            unsafe { forest_sim_add_random_fire(instance, &mut started) },
            ForestSimErrorCode::Ok
        );
        assert!(started <= 2);
        assert_eq!(stats(instance).burning, started);

        assert_eq!(forest_sim_set_wind_speed(instance, 1.5), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_set_wind_direction(instance, 0.0), ForestSimErrorCode::Ok);
        let (mut speed, mut dir, mut dx, mut dy) = (0.0, 0.0, 0.0, 0.0);
        let code = unsafe { forest_sim_get_wind(instance, &mut speed, &mut dir, &mut dx, &mut dy) };
        assert_eq!(code, ForestSimErrorCode::Ok);
        assert_eq!((speed, dir), (1.5, 0.0));
        assert_eq!((dx, dy), (1.0, 0.0));

        assert_eq!(forest_sim_set_fire_spread_speed(instance, 2.0), ForestSimErrorCode::InvalidParameter);
        assert_eq!(forest_sim_set_burn_speed(instance, 0.5), ForestSimErrorCode::Ok);
        assert_eq!(forest_sim_set_tick_interval(instance, 0.0), ForestSimErrorCode::InvalidParameter);

        unsafe { forest_sim_destroy(instance) };
    }
}
