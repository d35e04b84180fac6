//! Error type for forest commands
//!
//! Every failure is local to the command that raised it; the simulation keeps
//! ticking regardless.

use crate::grid::chunk::ChunkCoord;

/// Errors returned by point edits, configuration and wind updates
#[derive(Debug, Clone, PartialEq)]
pub enum ForestError {
    /// World position lies outside the area covered by the chunk grid
    CoordinateOutOfRange {
        /// Ground-plane x of the rejected position
        x: f32,
        /// Ground-plane y of the rejected position
        y: f32,
    },
    /// Target chunk has not been generated yet
    ChunkNotActive {
        /// Chunk the command resolved to
        chunk: ChunkCoord,
    },
    /// A tunable or wind parameter was rejected
    InvalidParameter(String),
}

impl ForestError {
    /// Create an invalid parameter error with a formatted message.
    pub fn invalid_parameter(name: &str, message: impl std::fmt::Display) -> Self {
        ForestError::InvalidParameter(format!("{name}: {message}"))
    }
}

impl std::fmt::Display for ForestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForestError::CoordinateOutOfRange { x, y } => {
                write!(f, "Position ({x}, {y}) is outside the forest")
            }
            ForestError::ChunkNotActive { chunk } => {
                write!(f, "Chunk ({}, {}) is not active", chunk.x, chunk.y)
            }
            ForestError::InvalidParameter(msg) => write!(f, "Invalid parameter {msg}"),
        }
    }
}

impl std::error::Error for ForestError {}
