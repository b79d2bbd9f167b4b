//! Voxel-based soft robots.
//!
//! A [`Robot`] owns a grid of [`Voxel`](sim_voxel::Voxel)s welded at shared
//! corners and exactly one [`Controller`]. Every simulated step the owner
//! runs:
//!
//! ```text
//! world.step() → robot.sync_from_world() → robot.act(t) → robot.flush_to_world()
//!                                            │
//!                                            ├─ voxel.act(t) for every voxel
//!                                            └─ controller.control(t, voxels)
//! ```
//!
//! # Example
//!
//! ```
//! use sim_robot::{build_body, PhaseSin, Robot};
//! use sim_types::Grid;
//! use sim_voxel::{Voxel, VoxelConfig};
//!
//! let shape = Grid::from_mask("11")?;
//! let body = build_body(&shape, |_, _| Voxel::new(VoxelConfig::default()))?;
//! let controller = PhaseSin::from_fn(2, 1, 1.0, 1.0, |x, _| x as f64 * std::f64::consts::PI);
//! let robot = Robot::new(body, Box::new(controller))?;
//! assert_eq!(robot.welds().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-robot/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,      // Grid indices to f64 are small
    clippy::missing_errors_doc,       // Error docs added where non-obvious
)]

mod controller;
mod error;
mod robot;
mod shape;

pub use controller::{Controller, PhaseSin, TimeFunction, TimeFunctions};
pub use error::{Result, RobotError};
pub use robot::{Robot, Weld};
pub use shape::{build_body, is_connected};
