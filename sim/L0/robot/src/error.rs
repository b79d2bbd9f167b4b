//! Error types for robot assembly.

use sim_types::SimError;
use thiserror::Error;

/// Errors that can occur while building or driving a robot.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RobotError {
    /// The robot has no voxels.
    #[error("robot body has no voxels")]
    EmptyBody,

    /// The controller expects a different grid.
    #[error("controller expects a {expected:?} grid but the body is {actual:?}")]
    GridMismatch {
        /// `(width, height)` declared by the controller.
        expected: (usize, usize),
        /// `(width, height)` of the voxel grid.
        actual: (usize, usize),
    },

    /// Voxels of different sizes cannot be welded together.
    #[error("voxel at ({x}, {y}) has side {side}, expected {expected}")]
    MixedSideLengths {
        /// Column of the offending voxel.
        x: usize,
        /// Row of the offending voxel.
        y: usize,
        /// Its side length.
        side: f64,
        /// Side length of the first voxel.
        expected: f64,
    },

    /// Error from the voxels or the physics world.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Result type for robot operations.
pub type Result<T> = std::result::Result<T, RobotError>;
