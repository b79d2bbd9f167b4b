//! Core value types for voxel-based soft robot simulation.
//!
//! This crate provides the small, dependency-light types every other layer
//! shares:
//!
//! - [`SpringRange`] - `(min, rest, max)` distance bounds of a structural spring
//! - [`TerrainProfile`] - x-sorted polyline ground profile with height lookup
//! - [`Grid`] - dense `(x, y)` grid used for robot bodies and snapshots
//! - [`BoundingBox`] and polygon helpers (shoelace area, vertex mean)
//! - [`WorldSettings`] - step size, substeps, gravity, friction
//! - [`SimError`] - configuration and runtime errors
//!
//! # Coordinate System
//!
//! - X: right (direction of locomotion)
//! - Y: up
//!
//! # Example
//!
//! ```
//! use sim_types::{SpringRange, TerrainProfile};
//!
//! let range = SpringRange::new(2.5, 3.0, 3.5).unwrap();
//! assert!((range.target(1.0) - 2.5).abs() < 1e-12);
//!
//! let ground = TerrainProfile::new(vec![0.0, 10.0], vec![0.0, 10.0]).unwrap();
//! assert!((ground.y_at(5.0) - 5.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::cast_precision_loss,       // usize to f64 is fine for counts
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod config;
mod error;
mod geometry;
mod grid;
mod spring;
pub mod terrain;

pub use config::WorldSettings;
pub use error::SimError;
pub use geometry::{area, signed_area, vertex_mean, BoundingBox};
pub use grid::Grid;
pub use spring::SpringRange;
pub use terrain::{TerrainProfile, GROUND_LEVEL, TERRAIN_LENGTH, WALL_HEIGHT, WALL_WIDTH};

// Re-export math types for convenience
pub use nalgebra::{Point2, Vector2};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
