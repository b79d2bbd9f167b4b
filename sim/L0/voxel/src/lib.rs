//! Deformable voxels for 2D soft robots.
//!
//! A [`Voxel`] is a square of side `L` built from four square corner masses
//! joined by soft distance springs (grouped into [`SpringScaffolding`]s) and
//! rope limiters that keep the masses from overlapping. Rigid limits on the
//! outer edges and diagonals cap the deformation. Actuation contracts or
//! expands the voxel within `1 ± δ` of its rest area:
//!
//! - [`ActuationMode::Distance`] moves every spring's target length inside
//!   its [`SpringRange`](sim_types::SpringRange)
//! - [`ActuationMode::Force`] pushes the masses toward or away from the
//!   centroid
//!
//! Voxels can carry [`Sensor`]s and a [`Breakage`] capability that makes
//! the actuator, sensors or structure fail stochastically and recover after
//! a quiet period.
//!
//! # Example
//!
//! ```
//! use sim_core::{PhysicsWorld, World};
//! use sim_types::WorldSettings;
//! use sim_voxel::{Voxel, VoxelConfig};
//!
//! let mut world = World::new(WorldSettings::default().zero_gravity())?;
//! let mut voxel = Voxel::new(VoxelConfig::default())?;
//! voxel.register(&mut world)?;
//!
//! for step in 1..=60 {
//!     voxel.apply_force(1.0);
//!     voxel.flush_to_world(&mut world)?;
//!     world.step()?;
//!     voxel.sync_from_world(&world)?;
//!     voxel.act(f64::from(step) / 60.0);
//! }
//! assert!(voxel.area_ratio() < 1.0);
//! # Ok::<(), sim_types::SimError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-voxel/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x >= 0.0) is intentional for NaN rejection
    clippy::missing_errors_doc,         // Error docs added where non-obvious
)]

mod breakage;
mod config;
mod poly;
pub mod sensor;
mod voxel;

pub use breakage::{Breakage, BreakageConfig, Component, Malfunction, Trigger};
pub use config::{ActuationMode, SpringScaffolding, VoxelConfig};
pub use poly::VoxelPoly;
pub use sensor::{Domain, Sensor};
pub use voxel::{Corner, Voxel};
