//! 2D rigid-body physics for voxel soft robots.
//!
//! This crate provides a small 2D world of square rigid bodies connected by
//! XPBD joints and resting on a piecewise-linear terrain. It is the engine
//! behind voxel simulation, exposed through the object-safe
//! [`PhysicsWorld`] trait so that other engines can be plugged in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         World                               │
//! │  bodies (squares) · joints (distance/rope/limit/weld)       │
//! │  terrain                                                    │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ step()
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   XPBD substep solver                       │
//! │  predict → project joints + contacts → derive velocities    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in
//! headless evaluation loops and batch experiments.
//!
//! # Quick Start
//!
//! ```
//! use sim_core::{BodyDesc, PhysicsWorld, World};
//! use sim_types::{Point2, TerrainProfile, WorldSettings};
//!
//! let mut world = World::new(WorldSettings::default())?;
//! world.set_terrain(TerrainProfile::flat(100.0, 0.0, 1.0, 10.0)?);
//! let body = world.add_body(BodyDesc::square(Point2::new(50.0, 3.0), 1.0, 1.0));
//!
//! for _ in 0..120 {
//!     world.step()?;
//! }
//! assert!(world.is_touching_ground(body));
//! # Ok::<(), sim_types::SimError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-core/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::too_many_arguments,         // XPBD helpers take the full constraint state
    clippy::doc_markdown,               // Not all technical terms need backticks
)]

mod body;
mod contact;
mod joint;
mod solver;
mod world;

pub use body::{BodyDesc, BodyId, BodyState};
pub use contact::ContactStats;
pub use joint::{JointDesc, JointId, JointKind};
pub use solver::StepStats;
pub use world::World;

use nalgebra::Vector2;
use sim_types::{Result, TerrainProfile, WorldSettings};

/// The engine boundary used by voxels, robots and tasks.
///
/// Implementations own rigid bodies, joints and at most one terrain
/// collider. Handles returned by `add_*` stay valid for the lifetime of the
/// world.
pub trait PhysicsWorld {
    /// Numeric settings of this world.
    fn settings(&self) -> &WorldSettings;

    /// Simulated time (seconds) since creation.
    fn time(&self) -> f64;

    /// Add a rigid square body.
    fn add_body(&mut self, desc: BodyDesc) -> BodyId;

    /// Add a joint between two existing bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if either body does not exist or both are the same.
    fn add_joint(&mut self, desc: JointDesc) -> Result<JointId>;

    /// Install the terrain collider, replacing any previous one.
    fn set_terrain(&mut self, terrain: TerrainProfile);

    /// Current state of a body, or `None` for an unknown handle.
    fn body_state(&self, id: BodyId) -> Option<BodyState>;

    /// Change the target length of a distance joint or the minimum length
    /// of a rope joint.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown handles, limit joints and weld joints.
    fn set_joint_target(&mut self, id: JointId, target: f64) -> Result<()>;

    /// Change the spring frequency and damping ratio of a distance joint.
    /// A frequency of zero makes it rigid.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown handles and non-distance joints.
    fn set_joint_softness(&mut self, id: JointId, frequency: f64, damping_ratio: f64)
        -> Result<()>;

    /// Accumulate a force on a body's center for the next step.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown handles.
    fn apply_force(&mut self, id: BodyId, force: Vector2<f64>) -> Result<()>;

    /// Whether the body touched the terrain during the last step.
    fn is_touching_ground(&self, id: BodyId) -> bool {
        self.body_state(id).is_some_and(|s| s.touching_ground)
    }

    /// Advance the world by one fixed step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Diverged`](sim_types::SimError::Diverged) if any
    /// body ends up with a non-finite state.
    fn step(&mut self) -> Result<()>;
}
