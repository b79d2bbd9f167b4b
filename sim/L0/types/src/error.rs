//! Error types for simulation operations.

use thiserror::Error;

/// Errors that can occur while configuring or stepping a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A spring range does not satisfy `0 <= min <= rest <= max`.
    #[error("invalid spring range: min={min}, rest={rest}, max={max}")]
    InvalidSpringRange {
        /// Minimum distance.
        min: f64,
        /// Rest distance.
        rest: f64,
        /// Maximum distance.
        max: f64,
    },

    /// A terrain profile is malformed (length mismatch, unsorted x, too short).
    #[error("invalid terrain profile: {reason}")]
    InvalidTerrain {
        /// Description of what's wrong.
        reason: String,
    },

    /// A grid shape description could not be parsed.
    #[error("invalid shape: {reason}")]
    InvalidShape {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Invalid body handle referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(usize),

    /// Invalid joint handle referenced.
    #[error("invalid joint ID: {0}")]
    InvalidJointId(usize),

    /// Simulation diverged (`NaN` or `Inf` detected).
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid terrain error.
    pub fn invalid_terrain(reason: impl Into<String>) -> Self {
        Self::InvalidTerrain {
            reason: reason.into(),
        }
    }

    /// Create an invalid shape error.
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a divergence error.
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error raised at construction time.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSpringRange { .. }
                | Self::InvalidTerrain { .. }
                | Self::InvalidShape { .. }
                | Self::InvalidTimestep(_)
                | Self::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidSpringRange {
            min: 2.0,
            rest: 1.0,
            max: 3.0,
        };
        assert!(err.to_string().contains("min=2"));

        let err = SimError::invalid_terrain("xs not sorted");
        assert_eq!(err.to_string(), "invalid terrain profile: xs not sorted");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(SimError::invalid_config("bad").is_configuration_error());
        assert!(SimError::InvalidTimestep(0.0).is_configuration_error());
        assert!(!SimError::diverged("nan").is_configuration_error());
        assert!(!SimError::InvalidBodyId(3).is_configuration_error());
    }
}
