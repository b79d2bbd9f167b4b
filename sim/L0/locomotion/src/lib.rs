//! Locomotion task for voxel soft robots.
//!
//! A [`Locomotion`] places a [`Robot`](sim_robot::Robot) just past the west
//! wall of a [`Ground`], steps a physics world at a fixed rate until
//! `final_t`, and records one [`Observation`] per step into an
//! [`Outcome`]. The outcome then answers how far and how efficiently the
//! robot moved, how its contact pattern with the ground repeats
//! ([`Footprint`]s and [`Gait`]s), and which frequencies dominate its motion
//! ([`SpectrumBin`]s).
//!
//! ```text
//!  Robot ──► Locomotion::apply ──► Outcome ──┬─ distance, velocity, efficiency
//!              │                             ├─ footprints ─► gaits ─► main gait
//!              └─ World (sim-core)           └─ velocity / angle spectra
//! ```
//!
//! # Example
//!
//! ```
//! use sim_locomotion::{Locomotion, LocomotionConfig};
//! use sim_robot::{build_body, PhaseSin, Robot};
//! use sim_types::Grid;
//! use sim_voxel::{Voxel, VoxelConfig};
//!
//! let body = build_body(&Grid::rectangle(2, 1), |_, _| Voxel::new(VoxelConfig::default()))?;
//! let controller = PhaseSin::from_fn(2, 1, 4.0, 1.0, |x, _| x as f64 * std::f64::consts::PI);
//! let mut robot = Robot::new(body, Box::new(controller))?;
//!
//! let task = Locomotion::flat(LocomotionConfig::default().with_final_t(1.0))?;
//! let outcome = task.apply(&mut robot, None)?;
//! assert_eq!(outcome.len(), 60);
//! assert!(outcome.distance().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `parallel` (default): evaluate [`BatchEvaluation`] runs with rayon.
//! - `serde`: serialization of configurations, observations and outcomes.

#![doc(html_root_url = "https://docs.rs/sim-locomotion/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,      // Sample counts and indices to f64 are small
    clippy::cast_possible_truncation, // Bucket and bin indices are clamped first
    clippy::cast_sign_loss,           // Same
    clippy::module_name_repetitions,  // LocomotionConfig in locomotion
)]

mod batch;
mod error;
mod footprint;
mod gait;
mod ground;
mod locomotion;
mod observation;
mod outcome;
mod spectrum;

pub use batch::BatchEvaluation;
pub use error::{LocomotionError, Result};
pub use footprint::{compute_footprint, quantize_footprints, Footprint};
pub use gait::{compute_gaits, main_gait, Gait};
pub use ground::{Ground, GROUND_THICKNESS};
pub use locomotion::{Locomotion, LocomotionConfig};
pub use observation::{Observation, SnapshotListener};
pub use outcome::{Outcome, MIN_GAIT_LENGTH};
pub use spectrum::{spectrum, SpectrumBin};
