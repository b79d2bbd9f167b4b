//! Polyline ground height profiles.
//!
//! A profile is a list of breakpoints `(xs[i], ys[i])` with strictly
//! increasing `xs`. Heights between breakpoints are linearly interpolated;
//! outside `[xs.first, xs.last]` the nearest edge height is used.
//!
//! ```text
//!  y
//!  │█                                   █
//!  │█                                   █
//!  │ ╲                                 ╱
//!  │  ╲_______________________________╱
//!  └─────────────────────────────────────── x
//! ```

use nalgebra::Vector2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Default height of the walls that close both ends of generated terrains.
pub const WALL_HEIGHT: f64 = 100.0;

/// Default horizontal extent of the end walls.
pub const WALL_WIDTH: f64 = 10.0;

/// Default total length of generated terrains.
pub const TERRAIN_LENGTH: f64 = 2000.0;

/// Default ground level of generated terrains.
pub const GROUND_LEVEL: f64 = 5.0;

/// An x-sorted polyline ground height profile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerrainProfile {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl TerrainProfile {
    /// Create a profile from breakpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTerrain`] if the arrays differ in length,
    /// hold fewer than two points, contain non-finite values, or `xs` is not
    /// strictly ascending.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(SimError::invalid_terrain(format!(
                "xs has {} points but ys has {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(SimError::invalid_terrain("at least two points required"));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(SimError::invalid_terrain("non-finite coordinate"));
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SimError::invalid_terrain(format!(
                "xs not strictly ascending at index {}",
                i + 1
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Flat ground at `level`, closed by walls of `wall_height` at both ends.
    ///
    /// # Errors
    ///
    /// Returns an error if `length <= 2 * wall_width`.
    pub fn flat(length: f64, level: f64, wall_width: f64, wall_height: f64) -> Result<Self> {
        Self::new(
            vec![0.0, wall_width, length - wall_width, length],
            vec![wall_height, level, level, wall_height],
        )
    }

    /// Rough ground made of segments of random width around `avg_width` and
    /// random height steps of up to `amplitude`, reproducible from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if `avg_width` is not positive.
    pub fn hilly(amplitude: f64, avg_width: f64, seed: u64) -> Result<Self> {
        if avg_width <= 0.0 || !avg_width.is_finite() {
            return Err(SimError::invalid_terrain("segment width must be positive"));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut xs = vec![0.0, WALL_WIDTH];
        let mut ys = vec![WALL_HEIGHT, GROUND_LEVEL];
        let mut x = WALL_WIDTH;
        let mut y = GROUND_LEVEL;
        while x < TERRAIN_LENGTH - WALL_WIDTH - 2.0 * avg_width {
            x += rng.gen_range(0.5..1.5) * avg_width;
            y = (y + rng.gen_range(-1.0..=1.0) * amplitude).max(0.0);
            xs.push(x);
            ys.push(y);
        }
        xs.push(TERRAIN_LENGTH - WALL_WIDTH);
        ys.push(GROUND_LEVEL);
        xs.push(TERRAIN_LENGTH);
        ys.push(WALL_HEIGHT);
        Self::new(xs, ys)
    }

    /// Staircase ground with steps of width `step_width` and height changes of
    /// up to `amplitude`, reproducible from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if `step_width` is not positive.
    pub fn steppy(amplitude: f64, step_width: f64, seed: u64) -> Result<Self> {
        if step_width <= 0.0 || !step_width.is_finite() {
            return Err(SimError::invalid_terrain("step width must be positive"));
        }
        let riser = step_width * 1e-3;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut xs = vec![0.0, WALL_WIDTH];
        let mut ys = vec![WALL_HEIGHT, GROUND_LEVEL];
        let mut x = WALL_WIDTH;
        let mut y = GROUND_LEVEL;
        while x < TERRAIN_LENGTH - WALL_WIDTH - 2.0 * step_width {
            x += step_width;
            xs.push(x);
            ys.push(y);
            y = (y + rng.gen_range(-1.0..=1.0) * amplitude).max(0.0);
            xs.push(x + riser);
            ys.push(y);
        }
        xs.push(TERRAIN_LENGTH - WALL_WIDTH);
        ys.push(GROUND_LEVEL);
        xs.push(TERRAIN_LENGTH);
        ys.push(WALL_HEIGHT);
        Self::new(xs, ys)
    }

    /// Breakpoint x coordinates.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Breakpoint heights.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false: a valid profile has at least two breakpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Leftmost x.
    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.xs[0]
    }

    /// Rightmost x.
    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Lowest breakpoint height.
    #[must_use]
    pub fn min_y(&self) -> f64 {
        self.ys.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Index `i` of the segment `[xs[i], xs[i + 1]]` containing `x`
    /// (clamped to the first/last segment).
    fn segment(&self, x: f64) -> usize {
        let last = self.xs.len() - 2;
        match self.xs.partition_point(|&xi| xi <= x) {
            0 => 0,
            p => (p - 1).min(last),
        }
    }

    /// Ground height at `x`, clamped to the edge heights outside the profile.
    #[must_use]
    pub fn y_at(&self, x: f64) -> f64 {
        if x <= self.min_x() {
            return self.ys[0];
        }
        if x >= self.max_x() {
            return self.ys[self.ys.len() - 1];
        }
        let i = self.segment(x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Unit surface normal at `x` (pointing up, out of the ground).
    #[must_use]
    pub fn normal_at(&self, x: f64) -> Vector2<f64> {
        if x < self.min_x() || x > self.max_x() {
            return Vector2::y();
        }
        let i = self.segment(x);
        let dx = self.xs[i + 1] - self.xs[i];
        let dy = self.ys[i + 1] - self.ys[i];
        Vector2::new(-dy, dx).normalize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn canonical() -> TerrainProfile {
        TerrainProfile::new(
            vec![0.0, 10.0, 1990.0, 2000.0],
            vec![100.0, 5.0, 5.0, 100.0],
        )
        .unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(TerrainProfile::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(TerrainProfile::new(vec![0.0], vec![0.0]).is_err());
        assert!(TerrainProfile::new(vec![0.0, 2.0, 1.0], vec![0.0, 0.0, 0.0]).is_err());
        assert!(TerrainProfile::new(vec![0.0, 0.0], vec![0.0, 0.0]).is_err());
        assert!(TerrainProfile::new(vec![0.0, f64::NAN], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_breakpoints_exact() {
        let t = canonical();
        for (x, y) in t.xs().iter().zip(t.ys()) {
            assert_relative_eq!(t.y_at(*x), *y);
        }
    }

    #[test]
    fn test_interpolation() {
        let t = canonical();
        assert_relative_eq!(t.y_at(5.0), 52.5);
        assert_relative_eq!(t.y_at(500.0), 5.0);
        assert_relative_eq!(t.y_at(1995.0), 52.5);
    }

    #[test]
    fn test_clamping_outside() {
        let t = canonical();
        assert_relative_eq!(t.y_at(-50.0), 100.0);
        assert_relative_eq!(t.y_at(5000.0), 100.0);
    }

    #[test]
    fn test_normal() {
        let t = canonical();
        let n = t.normal_at(500.0);
        assert_relative_eq!(n.y, 1.0);
        let n = t.normal_at(5.0);
        assert!(n.x > 0.0 && n.y > 0.0);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_generated_profiles_valid() {
        let flat = TerrainProfile::flat(TERRAIN_LENGTH, GROUND_LEVEL, WALL_WIDTH, WALL_HEIGHT)
            .unwrap();
        assert_eq!(flat, canonical());

        let a = TerrainProfile::hilly(1.0, 10.0, 7).unwrap();
        let b = TerrainProfile::hilly(1.0, 10.0, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.len() > 10);

        let s = TerrainProfile::steppy(1.0, 10.0, 3).unwrap();
        assert_relative_eq!(s.max_x(), TERRAIN_LENGTH);
        assert!(TerrainProfile::hilly(1.0, 0.0, 1).is_err());
    }
}
