//! Simulation world container.
//!
//! The [`World`] owns bodies, joints and the terrain collider and advances
//! them with the XPBD solver. It is the default implementation of
//! [`PhysicsWorld`].

use nalgebra::Vector2;
use sim_types::{Result, SimError, TerrainProfile, WorldSettings};
use tracing::{trace, warn};

use crate::body::{Body, BodyDesc, BodyId, BodyState};
use crate::joint::{Joint, JointDesc, JointId, JointKind};
use crate::solver::{self, StepStats};
use crate::PhysicsWorld;

/// A 2D physics world.
#[derive(Debug, Clone)]
pub struct World {
    settings: WorldSettings,
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    terrain: Option<TerrainProfile>,
    time: f64,
    step_count: u64,
    stats: StepStats,
}

impl Default for World {
    fn default() -> Self {
        Self {
            settings: WorldSettings::default(),
            bodies: Vec::new(),
            joints: Vec::new(),
            terrain: None,
            time: 0.0,
            step_count: 0,
            stats: StepStats::default(),
        }
    }
}

impl World {
    /// Create an empty world with validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(settings: WorldSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    /// Number of completed steps.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Statistics of the last step.
    #[must_use]
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// The terrain collider, if any.
    #[must_use]
    pub fn terrain(&self) -> Option<&TerrainProfile> {
        self.terrain.as_ref()
    }

    /// Parameters of a joint.
    #[must_use]
    pub fn joint_kind(&self, id: JointId) -> Option<JointKind> {
        self.joints.get(id.index()).map(|j| j.kind)
    }

    fn joint_mut(&mut self, id: JointId) -> Result<&mut Joint> {
        self.joints
            .get_mut(id.index())
            .ok_or(SimError::InvalidJointId(id.index()))
    }

    fn check_finite(&self) -> Result<()> {
        match self.bodies.iter().position(|b| !b.is_finite()) {
            None => Ok(()),
            Some(i) => {
                warn!(body = i, time = self.time, "world diverged");
                Err(SimError::diverged(format!(
                    "body {i} has a non-finite state at t={:.4}",
                    self.time
                )))
            }
        }
    }
}

impl PhysicsWorld for World {
    fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        self.bodies.push(Body::from_desc(&desc));
        BodyId::new(self.bodies.len() - 1)
    }

    fn add_joint(&mut self, desc: JointDesc) -> Result<JointId> {
        for id in [desc.body_a, desc.body_b] {
            if id.index() >= self.bodies.len() {
                return Err(SimError::InvalidBodyId(id.index()));
            }
        }
        if desc.body_a == desc.body_b {
            return Err(SimError::invalid_config(format!(
                "joint connects body {} to itself",
                desc.body_a.index()
            )));
        }
        self.joints.push(Joint::new(&desc, &self.bodies));
        Ok(JointId::new(self.joints.len() - 1))
    }

    fn set_terrain(&mut self, terrain: TerrainProfile) {
        self.terrain = Some(terrain);
    }

    fn body_state(&self, id: BodyId) -> Option<BodyState> {
        self.bodies.get(id.index()).map(Body::state)
    }

    fn set_joint_target(&mut self, id: JointId, target: f64) -> Result<()> {
        let joint = self.joint_mut(id)?;
        match &mut joint.kind {
            JointKind::Distance { length, .. } => *length = target,
            JointKind::Rope { min_length } => *min_length = target,
            JointKind::Limit { .. } => {
                return Err(SimError::invalid_config("limit joints have no single target distance"));
            }
            JointKind::Weld { .. } => {
                return Err(SimError::invalid_config("weld joints have no target distance"));
            }
        }
        Ok(())
    }

    fn set_joint_softness(&mut self, id: JointId, frequency: f64, damping_ratio: f64) -> Result<()> {
        let joint = self.joint_mut(id)?;
        match &mut joint.kind {
            JointKind::Distance {
                frequency: f,
                damping_ratio: d,
                ..
            } => {
                *f = frequency;
                *d = damping_ratio;
                Ok(())
            }
            _ => Err(SimError::invalid_config(
                "only distance joints have frequency and damping",
            )),
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vector2<f64>) -> Result<()> {
        let body = self
            .bodies
            .get_mut(id.index())
            .ok_or(SimError::InvalidBodyId(id.index()))?;
        body.force += force;
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.stats = solver::step(
            &mut self.bodies,
            &mut self.joints,
            self.terrain.as_ref(),
            &self.settings,
        );
        self.step_count += 1;
        self.time = self.step_count as f64 * self.settings.step_size;
        trace!(
            time = self.time,
            contacts = self.stats.contacts.num_contacts,
            kinetic_energy = self.stats.kinetic_energy,
            "world step"
        );
        self.check_finite()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn flat_world() -> World {
        let mut world = World::new(WorldSettings::default()).unwrap();
        world.set_terrain(TerrainProfile::new(vec![-50.0, 50.0], vec![0.0, 0.0]).unwrap());
        world
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = WorldSettings::with_step_size(0.0);
        assert!(World::new(settings).is_err());
    }

    #[test]
    fn test_free_fall() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let id = world.add_body(BodyDesc::square(Point2::new(0.0, 10.0), 1.0, 1.0));
        for _ in 0..60 {
            world.step().unwrap();
        }
        let state = world.body_state(id).unwrap();
        assert_relative_eq!(world.time(), 1.0, epsilon = 1e-9);
        // y = 10 - g t² / 2, up to the semi-implicit integration error
        assert_relative_eq!(state.position.y, 5.0, epsilon = 0.05);
        assert_relative_eq!(state.linear_velocity.y, -10.0, epsilon = 1e-6);
        assert!(!state.touching_ground);
    }

    #[test]
    fn test_body_rests_on_ground() {
        let mut world = flat_world();
        let id = world.add_body(BodyDesc::square(Point2::new(0.0, 2.0), 1.0, 1.0));
        for _ in 0..180 {
            world.step().unwrap();
        }
        let state = world.body_state(id).unwrap();
        assert!(state.touching_ground);
        assert!(world.is_touching_ground(id));
        assert_relative_eq!(state.position.y, 0.5, epsilon = 0.02);
        assert!(state.linear_velocity.norm() < 0.1);
    }

    #[test]
    fn test_spring_oscillates_toward_target() {
        let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
        let a = world.add_body(BodyDesc::square(Point2::new(0.0, 0.0), 0.1, 1.0));
        let b = world.add_body(BodyDesc::square(Point2::new(2.0, 0.0), 0.1, 1.0));
        let joint = world
            .add_joint(
                JointDesc::distance(a, b, Vector2::zeros(), Vector2::zeros(), 2.0)
                    .with_softness(4.0, 0.7),
            )
            .unwrap();
        world.set_joint_target(joint, 1.0).unwrap();
        for _ in 0..120 {
            world.step().unwrap();
        }
        let pa = world.body_state(a).unwrap().position;
        let pb = world.body_state(b).unwrap().position;
        assert_relative_eq!((pb - pa).norm(), 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_joint_errors() {
        let mut world = World::default();
        let a = world.add_body(BodyDesc::square(Point2::origin(), 1.0, 1.0));
        let ghost = BodyId::new(9);
        let desc = JointDesc::weld(a, ghost, Vector2::zeros(), Vector2::zeros());
        assert_eq!(world.add_joint(desc), Err(SimError::InvalidBodyId(9)));

        let self_joint = JointDesc::weld(a, a, Vector2::zeros(), Vector2::zeros());
        assert!(world.add_joint(self_joint).is_err());

        assert!(world.set_joint_target(JointId::new(3), 1.0).is_err());
        assert!(world.apply_force(ghost, Vector2::x()).is_err());
    }

    #[test]
    fn test_force_is_cleared_after_step() {
        let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
        let id = world.add_body(BodyDesc::square(Point2::origin(), 1.0, 1.0));
        world.apply_force(id, Vector2::new(60.0, 0.0)).unwrap();
        world.step().unwrap();
        let v1 = world.body_state(id).unwrap().linear_velocity.x;
        world.step().unwrap();
        let v2 = world.body_state(id).unwrap().linear_velocity.x;
        assert_relative_eq!(v1, 1.0, epsilon = 1e-9);
        assert_relative_eq!(v2, v1, epsilon = 1e-12);
    }
}
