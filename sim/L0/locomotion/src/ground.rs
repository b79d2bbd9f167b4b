//! Static terrain.
//!
//! The world collides against the polyline profile itself. The ground also
//! keeps the solid outline under that profile: a chain of trapezoids that
//! reach down to a common floor, closed by two side skirts. The outline is
//! for drawing and export and plays no part in contact resolution:
//!
//! ```text
//!  ┌─┐                               ┌─┐
//!  │ │╲                             ╱│ │
//!  │ │ ╲___________________________╱ │ │
//!  │ │  │  │                    │  │ │ │
//!  └─┴──┴──┴────────────────────┴──┴─┴─┘  floor = min y − thickness
//! ```

use nalgebra::Point2;
use sim_core::PhysicsWorld;
use sim_types::{Result, TerrainProfile};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Depth of the skirts below the lowest breakpoint and width of the side
/// skirts.
pub const GROUND_THICKNESS: f64 = 1.0;

/// Static terrain built from a polyline profile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ground {
    profile: TerrainProfile,
    polygons: Vec<[Point2<f64>; 4]>,
}

impl Ground {
    /// Build ground from breakpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if `xs` and `ys` differ in length, have fewer than
    /// two points or `xs` is not strictly ascending.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        TerrainProfile::new(xs, ys).map(Self::from_profile)
    }

    /// Build ground from a validated profile.
    #[must_use]
    pub fn from_profile(profile: TerrainProfile) -> Self {
        let polygons = build_polygons(&profile);
        Self { profile, polygons }
    }

    /// The height profile.
    #[must_use]
    pub fn profile(&self) -> &TerrainProfile {
        &self.profile
    }

    /// Solid outline of the ground: one trapezoid per segment, then the
    /// west and east skirts. Vertices are counter-clockwise.
    ///
    /// Collision uses the profile installed by [`Ground::register`]; the
    /// outline's upper edges trace that same profile.
    #[must_use]
    pub fn polygons(&self) -> &[[Point2<f64>; 4]] {
        &self.polygons
    }

    /// Height at `x`, interpolated between breakpoints and clamped to the
    /// edge values outside the profile.
    #[must_use]
    pub fn y_at(&self, x: f64) -> f64 {
        self.profile.y_at(x)
    }

    /// Install this ground as the world's terrain collider.
    pub fn register(&self, world: &mut dyn PhysicsWorld) {
        world.set_terrain(self.profile.clone());
    }
}

fn build_polygons(profile: &TerrainProfile) -> Vec<[Point2<f64>; 4]> {
    let floor = profile.min_y() - GROUND_THICKNESS;
    let (xs, ys) = (profile.xs(), profile.ys());
    let mut polygons: Vec<[Point2<f64>; 4]> = xs
        .windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| {
            [
                Point2::new(x[0], floor),
                Point2::new(x[1], floor),
                Point2::new(x[1], y[1]),
                Point2::new(x[0], y[0]),
            ]
        })
        .collect();

    let (x0, y0) = (profile.min_x(), ys.first().copied().unwrap_or(floor));
    let (x1, y1) = (profile.max_x(), ys.last().copied().unwrap_or(floor));
    polygons.push([
        Point2::new(x0 - GROUND_THICKNESS, floor),
        Point2::new(x0, floor),
        Point2::new(x0, y0),
        Point2::new(x0 - GROUND_THICKNESS, y0),
    ]);
    polygons.push([
        Point2::new(x1, floor),
        Point2::new(x1 + GROUND_THICKNESS, floor),
        Point2::new(x1 + GROUND_THICKNESS, y1),
        Point2::new(x1, y1),
    ]);
    polygons
}
