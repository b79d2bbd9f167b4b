//! Configuration types for the physics world.
//!
//! These settings control how the world advances: fixed step size, XPBD
//! substeps and iterations, gravity and contact material.

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Numeric settings of a physics world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSettings {
    /// Fixed simulated time advanced by one world step (seconds).
    pub step_size: f64,
    /// Number of XPBD substeps per step.
    /// More substeps = stiffer constraints and more stable contacts.
    pub num_substeps: u32,
    /// Number of constraint iterations per substep.
    pub num_iterations: u32,
    /// Gravitational acceleration.
    pub gravity: Vector2<f64>,
    /// Coulomb friction coefficient between bodies and terrain.
    pub friction: f64,
    /// Contact distance below which a body counts as touching the ground.
    pub contact_slop: f64,
    /// Maximum body speed (prevents explosion).
    /// Set to `f64::INFINITY` to disable.
    pub max_velocity: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            step_size: 1.0 / 60.0,
            num_substeps: 8,
            num_iterations: 1,
            gravity: Vector2::new(0.0, -10.0),
            friction: 1.0,
            contact_slop: 0.01,
            max_velocity: 200.0,
        }
    }
}

impl WorldSettings {
    /// Create settings with the given step size.
    #[must_use]
    pub fn with_step_size(step_size: f64) -> Self {
        Self {
            step_size,
            ..Default::default()
        }
    }

    /// Settings for accuracy at the cost of speed.
    #[must_use]
    pub fn accurate() -> Self {
        Self {
            num_substeps: 20,
            num_iterations: 2,
            ..Default::default()
        }
    }

    /// Settings for fast, low-fidelity evaluation.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            num_substeps: 4,
            ..Default::default()
        }
    }

    /// Set the substep and iteration counts.
    #[must_use]
    pub fn iterations(mut self, substeps: u32, iterations: u32) -> Self {
        self.num_substeps = substeps;
        self.num_iterations = iterations;
        self
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn gravity(mut self, gravity: Vector2<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vector2::zeros();
        self
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Duration of one substep.
    #[must_use]
    pub fn substep_size(&self) -> f64 {
        self.step_size / f64::from(self.num_substeps.max(1))
    }

    /// Steps per simulated second.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.step_size
    }

    /// Validate the settings.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(crate::SimError::InvalidTimestep(self.step_size));
        }

        if self.step_size > 1.0 {
            return Err(crate::SimError::invalid_config(
                "step_size > 1 second is likely an error",
            ));
        }

        if self.num_substeps == 0 || self.num_iterations == 0 {
            return Err(crate::SimError::invalid_config(
                "num_substeps and num_iterations must be at least 1",
            ));
        }

        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(crate::SimError::invalid_config("gravity must be finite"));
        }

        if self.friction < 0.0 || !self.friction.is_finite() {
            return Err(crate::SimError::invalid_config(
                "friction must be finite and non-negative",
            ));
        }

        if self.contact_slop < 0.0 {
            return Err(crate::SimError::invalid_config(
                "contact_slop cannot be negative",
            ));
        }

        if self.max_velocity <= 0.0 {
            return Err(crate::SimError::invalid_config(
                "max_velocity must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_settings() {
        let settings = WorldSettings::default();
        assert!(settings.validate().is_ok());
        assert_relative_eq!(settings.step_size, 1.0 / 60.0, epsilon = 1e-12);
        assert_relative_eq!(settings.gravity.y, -10.0);
        assert_relative_eq!(settings.substep_size(), 1.0 / 480.0, epsilon = 1e-12);
    }

    #[test]
    fn test_presets() {
        assert!(WorldSettings::accurate().num_substeps > WorldSettings::default().num_substeps);
        assert!(WorldSettings::fast().num_substeps < WorldSettings::default().num_substeps);
        assert!(WorldSettings::fast().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let settings = WorldSettings::with_step_size(0.01)
            .zero_gravity()
            .iterations(2, 3)
            .friction(-4.0);

        assert_relative_eq!(settings.frequency(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(settings.gravity.norm(), 0.0);
        assert_eq!(settings.num_substeps, 2);
        assert_eq!(settings.num_iterations, 3);
        assert_relative_eq!(settings.friction, 0.0);
    }

    #[test]
    fn test_validation() {
        let mut settings = WorldSettings::default();
        settings.step_size = -0.01;
        assert!(settings.validate().is_err());

        settings.step_size = f64::NAN;
        assert!(settings.validate().is_err());

        settings.step_size = 0.01;
        settings.num_substeps = 0;
        assert!(settings.validate().is_err());

        settings.num_substeps = 4;
        settings.gravity = Vector2::new(0.0, f64::INFINITY);
        assert!(settings.validate().is_err());
    }
}
