//! The locomotion task: place a robot on the ground and run it for a fixed
//! simulated time.

use std::time::Instant;

use nalgebra::Vector2;
use sim_core::{PhysicsWorld, World};
use sim_robot::Robot;
use sim_types::{TerrainProfile, WorldSettings, GROUND_LEVEL, TERRAIN_LENGTH, WALL_HEIGHT, WALL_WIDTH};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::ground::Ground;
use crate::observation::{Observation, SnapshotListener};
use crate::outcome::Outcome;

/// Parameters of a locomotion run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocomotionConfig {
    /// Simulated time at which the run stops (s).
    pub final_t: f64,
    /// Horizontal gap between the first ground breakpoint past the west
    /// wall and the robot's leftmost point.
    pub initial_placement_x_gap: f64,
    /// Vertical gap between the ground and the lowest voxel.
    pub initial_placement_y_gap: f64,
    /// Physics world settings.
    pub world: WorldSettings,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            final_t: 30.0,
            initial_placement_x_gap: 1.0,
            initial_placement_y_gap: 1.0,
            world: WorldSettings::default(),
        }
    }
}

impl LocomotionConfig {
    /// Set the simulated duration.
    #[must_use]
    pub fn with_final_t(mut self, final_t: f64) -> Self {
        self.final_t = final_t;
        self
    }

    /// Set the initial placement gaps.
    #[must_use]
    pub fn with_placement(mut self, x_gap: f64, y_gap: f64) -> Self {
        self.initial_placement_x_gap = x_gap;
        self.initial_placement_y_gap = y_gap;
        self
    }

    /// Set the world settings.
    #[must_use]
    pub fn with_world(mut self, world: WorldSettings) -> Self {
        self.world = world;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration is not positive, a gap is not
    /// finite or the world settings are invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.final_t > 0.0) || !self.final_t.is_finite() {
            return Err(LocomotionError::invalid_config(format!(
                "final_t must be positive and finite, got {}",
                self.final_t
            )));
        }
        if !self.initial_placement_x_gap.is_finite() || !self.initial_placement_y_gap.is_finite() {
            return Err(LocomotionError::invalid_config("placement gaps must be finite"));
        }
        self.world.validate()?;
        Ok(())
    }
}

/// A locomotion task over a fixed ground.
#[derive(Debug, Clone, PartialEq)]
pub struct Locomotion {
    config: LocomotionConfig,
    ground: Ground,
}

impl Locomotion {
    /// Create a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(ground: Ground, config: LocomotionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ground })
    }

    /// Task on flat ground between two walls.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn flat(config: LocomotionConfig) -> Result<Self> {
        let profile = TerrainProfile::flat(TERRAIN_LENGTH, GROUND_LEVEL, WALL_WIDTH, WALL_HEIGHT)?;
        Self::new(Ground::from_profile(profile), config)
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// The ground.
    #[must_use]
    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    /// Run `robot` in a fresh [`World`].
    ///
    /// # Errors
    ///
    /// Returns an error if the robot has no voxels, the world rejects it or
    /// the simulation diverges.
    pub fn apply(&self, robot: &mut Robot, listener: Option<&mut dyn SnapshotListener>) -> Result<Outcome> {
        let mut world = World::new(self.config.world.clone())?;
        self.apply_in(&mut world, robot, listener)
    }

    /// Run `robot` in `world`, which must be empty.
    ///
    /// The robot is reset, placed past the west wall at the configured gap
    /// above the ground, then stepped until the world clock reaches
    /// `final_t`. One observation is recorded per step.
    ///
    /// # Errors
    ///
    /// Returns an error if the robot has no voxels, the world rejects it or
    /// the simulation diverges.
    pub fn apply_in(
        &self,
        world: &mut dyn PhysicsWorld,
        robot: &mut Robot,
        mut listener: Option<&mut dyn SnapshotListener>,
    ) -> Result<Outcome> {
        let started = Instant::now();
        self.place(robot)?;
        self.ground.register(world);
        robot.register(world)?;
        robot.flush_to_world(world)?;
        debug!(
            voxels = robot.num_voxels(),
            final_t = self.config.final_t,
            "locomotion started"
        );

        let mut observations = Vec::new();
        let mut t = world.time();
        while t < self.config.final_t {
            world.step()?;
            t = world.time();
            robot.sync_from_world(world)?;
            robot.act(t);
            robot.flush_to_world(world)?;

            let polys = robot.polys();
            let x = robot.center()?.x;
            let observation = Observation::new(polys, self.ground.y_at(x), started.elapsed().as_secs_f64());
            trace!(t, x, "step");
            if let Some(listener) = listener.as_deref_mut() {
                listener.on_snapshot(t, &observation);
            }
            observations.push((t, observation));
        }

        let outcome = Outcome::new(observations);
        debug!(
            steps = outcome.len(),
            distance = outcome.distance().unwrap_or(0.0),
            seconds = started.elapsed().as_secs_f64(),
            "locomotion finished"
        );
        Ok(outcome)
    }

    fn place(&self, robot: &mut Robot) -> Result<()> {
        robot.reset();
        let bb = robot.bounding_box()?;
        let profile = self.ground.profile();
        let start = profile.xs().get(1).copied().unwrap_or_else(|| profile.min_x());
        robot.translate(&Vector2::new(
            start + self.config.initial_placement_x_gap - bb.min.x,
            0.0,
        ));

        let lowest = robot
            .voxels()
            .occupied()
            .map(|(_, _, v)| v.bounding_box().min.y - self.ground.y_at(v.center().x))
            .fold(f64::INFINITY, f64::min);
        robot.translate(&Vector2::new(0.0, self.config.initial_placement_y_gap - lowest));
        Ok(())
    }
}
