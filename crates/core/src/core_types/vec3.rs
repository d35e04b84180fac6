//! Vector type aliases for world positions and directions.

use nalgebra::{Vector2, Vector3};

/// 3D vector type for world positions.
///
/// Ground plane is (x, y); z is terrain elevation. This is a simple alias for
/// `nalgebra::Vector3<f32>`, used for tree positions handed to renderers and
/// for world positions passed to point edits.
pub type Vec3 = Vector3<f32>;

/// 2D vector type for ground-plane directions (wind, neighbour offsets).
pub type Vec2 = Vector2<f32>;
