//! Distance bounds of a structural spring.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// The `(min, rest, max)` distance bounds of one spring.
///
/// Always satisfies `0 <= min <= rest <= max`; the constructor rejects
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringRange {
    min: f64,
    rest: f64,
    max: f64,
}

impl SpringRange {
    /// Create a spring range, validating the ordering.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidSpringRange`] if any bound is not finite,
    /// `min < 0`, `min > rest` or `max < rest`.
    pub fn new(min: f64, rest: f64, max: f64) -> Result<Self> {
        let finite = min.is_finite() && rest.is_finite() && max.is_finite();
        if !finite || min < 0.0 || min > rest || max < rest {
            return Err(SimError::InvalidSpringRange { min, rest, max });
        }
        Ok(Self { min, rest, max })
    }

    /// A degenerate range where all three bounds equal `rest`.
    ///
    /// # Errors
    ///
    /// Returns an error if `rest` is negative or not finite.
    pub fn fixed(rest: f64) -> Result<Self> {
        Self::new(rest, rest, rest)
    }

    /// Minimum distance.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Rest distance.
    #[must_use]
    pub const fn rest(&self) -> f64 {
        self.rest
    }

    /// Maximum distance.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Target distance for an actuation value `f` in `[-1, 1]`.
    ///
    /// Positive values contract toward `min`, negative values expand toward
    /// `max`. Inputs outside `[-1, 1]` are clamped.
    #[must_use]
    pub fn target(&self, f: f64) -> f64 {
        let f = f.clamp(-1.0, 1.0);
        let target = if f >= 0.0 {
            self.rest - (self.rest - self.min) * f
        } else {
            self.rest + (self.max - self.rest) * (-f)
        };
        target.clamp(self.min, self.max)
    }

    /// Map every bound through a monotonically non-decreasing function.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped bounds are no longer ordered.
    pub fn map(&self, g: impl Fn(f64) -> f64) -> Result<Self> {
        Self::new(g(self.min), g(self.rest), g(self.max))
    }

    /// Check if `d` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, d: f64) -> bool {
        d >= self.min && d <= self.max
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_valid_range() {
        let r = SpringRange::new(1.0, 2.0, 3.0).unwrap();
        assert_relative_eq!(r.min(), 1.0);
        assert_relative_eq!(r.rest(), 2.0);
        assert_relative_eq!(r.max(), 3.0);
        assert!(r.contains(2.5));
        assert!(!r.contains(3.5));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(SpringRange::new(2.5, 2.0, 3.0).is_err());
        assert!(SpringRange::new(1.0, 2.0, 1.5).is_err());
        assert!(SpringRange::new(-0.1, 2.0, 3.0).is_err());
        assert!(SpringRange::new(1.0, f64::NAN, 3.0).is_err());
    }

    #[test]
    fn test_target() {
        let r = SpringRange::new(1.0, 2.0, 4.0).unwrap();
        assert_relative_eq!(r.target(0.0), 2.0);
        assert_relative_eq!(r.target(1.0), 1.0);
        assert_relative_eq!(r.target(0.5), 1.5);
        assert_relative_eq!(r.target(-1.0), 4.0);
        assert_relative_eq!(r.target(-0.5), 3.0);
        // Clamped
        assert_relative_eq!(r.target(7.0), 1.0);
        assert_relative_eq!(r.target(-7.0), 4.0);
    }

    #[test]
    fn test_map() {
        let r = SpringRange::new(1.0, 2.0, 3.0).unwrap();
        let shifted = r.map(|d| d - 1.0).unwrap();
        assert_relative_eq!(shifted.min(), 0.0);
        assert!(r.map(|d| d - 1.5).is_err());
    }
}
