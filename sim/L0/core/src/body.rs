//! Rigid square bodies.
//!
//! Every dynamic body in the world is a small square with uniform density:
//! the corner masses of a voxel. A body carries its own mass, rotational
//! inertia `m·s²/6` (for side `s`) and damping.

use nalgebra::{Point2, UnitComplex, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle of a body inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(usize);

impl BodyId {
    /// Create a body handle from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Description of a body to add to a world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDesc {
    /// Initial center position.
    pub position: Point2<f64>,
    /// Initial orientation (radians, counter-clockwise).
    pub angle: f64,
    /// Side length of the square collision footprint.
    pub side: f64,
    /// Mass. Zero or infinite mass makes the body static.
    pub mass: f64,
    /// Linear velocity damping (1/s).
    pub linear_damping: f64,
    /// Angular velocity damping (1/s).
    pub angular_damping: f64,
    /// Initial linear velocity.
    pub linear_velocity: Vector2<f64>,
}

impl BodyDesc {
    /// A dynamic square body at rest.
    #[must_use]
    pub fn square(position: Point2<f64>, side: f64, mass: f64) -> Self {
        Self {
            position,
            angle: 0.0,
            side,
            mass,
            linear_damping: 0.0,
            angular_damping: 0.0,
            linear_velocity: Vector2::zeros(),
        }
    }

    /// Set the initial orientation.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set linear and angular damping.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
        self
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector2<f64>) -> Self {
        self.linear_velocity = velocity;
        self
    }
}

/// Read-only snapshot of a body's kinematic state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// Center position.
    pub position: Point2<f64>,
    /// Orientation (radians).
    pub angle: f64,
    /// Linear velocity of the center.
    pub linear_velocity: Vector2<f64>,
    /// Angular velocity (rad/s).
    pub angular_velocity: f64,
    /// Whether the body touched the terrain during the last step.
    pub touching_ground: bool,
}

impl BodyState {
    /// World position of a point given in body-local coordinates.
    #[must_use]
    pub fn world_point(&self, local: &Vector2<f64>) -> Point2<f64> {
        self.position + UnitComplex::new(self.angle) * local
    }
}

/// A body as stored in the world.
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub position: Point2<f64>,
    pub angle: f64,
    pub velocity: Vector2<f64>,
    pub angular_velocity: f64,
    pub prev_position: Point2<f64>,
    pub prev_angle: f64,
    pub inv_mass: f64,
    pub inv_inertia: f64,
    pub half_side: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub force: Vector2<f64>,
    pub touching_ground: bool,
}

impl Body {
    pub fn from_desc(desc: &BodyDesc) -> Self {
        let dynamic = desc.mass.is_finite() && desc.mass > 0.0;
        let (inv_mass, inv_inertia) = if dynamic {
            let inertia = desc.mass * desc.side * desc.side / 6.0;
            (1.0 / desc.mass, if inertia > 0.0 { 1.0 / inertia } else { 0.0 })
        } else {
            (0.0, 0.0)
        };
        Self {
            position: desc.position,
            angle: desc.angle,
            velocity: desc.linear_velocity,
            angular_velocity: 0.0,
            prev_position: desc.position,
            prev_angle: desc.angle,
            inv_mass,
            inv_inertia,
            half_side: desc.side / 2.0,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            force: Vector2::zeros(),
            touching_ground: false,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.inv_mass > 0.0
    }

    pub fn rotation(&self) -> UnitComplex<f64> {
        UnitComplex::new(self.angle)
    }

    /// Local anchor rotated into world orientation (not translated).
    pub fn world_offset(&self, local: &Vector2<f64>) -> Vector2<f64> {
        self.rotation() * local
    }

    /// Position of a local anchor at the start of the current substep.
    pub fn prev_world_point(&self, local: &Vector2<f64>) -> Point2<f64> {
        self.prev_position + UnitComplex::new(self.prev_angle) * local
    }

    /// Local coordinates of the four corners, counter-clockwise from lower-left.
    pub fn local_corners(&self) -> [Vector2<f64>; 4] {
        let h = self.half_side;
        [
            Vector2::new(-h, -h),
            Vector2::new(h, -h),
            Vector2::new(h, h),
            Vector2::new(-h, h),
        ]
    }

    /// Inverse mass seen by a positional correction along `n` applied at
    /// world offset `r` from the center.
    pub fn generalized_inverse_mass(&self, r: &Vector2<f64>, n: &Vector2<f64>) -> f64 {
        let rn = r.perp(n);
        self.inv_mass + self.inv_inertia * rn * rn
    }

    /// Apply a positional impulse `p` at world offset `r`.
    pub fn apply_correction(&mut self, r: &Vector2<f64>, p: &Vector2<f64>) {
        self.position += p * self.inv_mass;
        self.angle += self.inv_inertia * r.perp(p);
    }

    pub fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            angle: self.angle,
            linear_velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            touching_ground: self.touching_ground,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|v| v.is_finite())
            && self.angle.is_finite()
            && self.velocity.iter().all(|v| v.is_finite())
            && self.angular_velocity.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mass_properties() {
        let body = Body::from_desc(&BodyDesc::square(Point2::origin(), 1.0, 2.0));
        assert_relative_eq!(body.inv_mass, 0.5);
        assert_relative_eq!(body.inv_inertia, 3.0);
        assert!(body.is_dynamic());

        let fixed = Body::from_desc(&BodyDesc::square(Point2::origin(), 1.0, f64::INFINITY));
        assert!(!fixed.is_dynamic());
        assert_relative_eq!(fixed.inv_inertia, 0.0);
    }

    #[test]
    fn test_world_point_rotation() {
        let desc = BodyDesc::square(Point2::new(1.0, 1.0), 1.0, 1.0)
            .with_angle(std::f64::consts::FRAC_PI_2);
        let state = Body::from_desc(&desc).state();
        let p = state.world_point(&Vector2::new(1.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_generalized_inverse_mass() {
        let body = Body::from_desc(&BodyDesc::square(Point2::origin(), 1.0, 1.0));
        let n = Vector2::y();
        // Correction through the center only sees the linear mass
        assert_relative_eq!(body.generalized_inverse_mass(&Vector2::zeros(), &n), 1.0);
        // Off-center corrections also rotate the body
        let w = body.generalized_inverse_mass(&Vector2::new(0.5, 0.0), &n);
        assert_relative_eq!(w, 1.0 + 6.0 * 0.25);
    }
}
