//! Core types and utilities

pub mod cell;
pub mod noise;
pub mod vec3;

pub use cell::{Cell, CellCategory};
pub use noise::{NoiseField, NoiseParams};
pub use vec3::{Vec2, Vec3};
