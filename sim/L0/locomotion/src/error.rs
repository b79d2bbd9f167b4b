//! Error types for locomotion runs.

use sim_robot::RobotError;
use sim_types::SimError;
use thiserror::Error;

/// Errors that can occur while configuring or running a locomotion task.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocomotionError {
    /// Invalid task configuration.
    #[error("invalid locomotion configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Error from the robot.
    #[error(transparent)]
    Robot(#[from] RobotError),

    /// Error from the terrain or the physics world.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl LocomotionError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether the physics world diverged during the run.
    #[must_use]
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            Self::Sim(SimError::Diverged { .. }) | Self::Robot(RobotError::Sim(SimError::Diverged { .. }))
        )
    }
}

/// Result type for locomotion operations.
pub type Result<T> = std::result::Result<T, LocomotionError>;
