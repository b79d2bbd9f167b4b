//! Joints between bodies, solved as XPBD constraints.
//!
//! - [`JointKind::Distance`] - soft spring with mutable target length
//! - [`JointKind::Rope`] - one-sided lower bound on the anchor distance
//! - [`JointKind::Limit`] - anchor distance held inside `[min, max]`
//! - [`JointKind::Weld`] - anchors coincide and relative angle is locked
//!
//! # XPBD Constraint Solving
//!
//! Each positional constraint follows the XPBD formulation with damping:
//!
//! ```text
//! Δλ = (-C - α̃ λ - γ ∇C·Δx) / ((1 + γ) (w_a + w_b) + α̃)
//! ```
//!
//! Where:
//! - `α̃ = α / h²` is the time-scaled compliance (`α = 1/k`)
//! - `γ = α̃ c h` is the time-scaled damping
//! - `w` are generalized inverse masses at the anchors

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};

/// Handle of a joint inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(usize);

impl JointId {
    /// Create a joint handle from a raw index.
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

/// Type-specific joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// Spring pulling the anchors toward `length`.
    ///
    /// `frequency` is the spring's natural frequency in Hz and
    /// `damping_ratio` its damping relative to critical. A frequency of zero
    /// makes the joint rigid.
    Distance {
        /// Target distance between anchors.
        length: f64,
        /// Natural frequency (Hz).
        frequency: f64,
        /// Damping ratio.
        damping_ratio: f64,
    },
    /// Anchors may not get closer than `min_length`.
    Rope {
        /// Minimum distance between anchors.
        min_length: f64,
    },
    /// Anchor distance stays within `[min_length, max_length]`.
    Limit {
        /// Minimum distance between anchors.
        min_length: f64,
        /// Maximum distance between anchors.
        max_length: f64,
    },
    /// Anchors coincide and the relative angle stays at `reference_angle`.
    Weld {
        /// Relative angle `angle_b - angle_a` to maintain.
        reference_angle: f64,
    },
}

/// Description of a joint to add to a world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointDesc {
    /// First body.
    pub body_a: BodyId,
    /// Second body.
    pub body_b: BodyId,
    /// Anchor on the first body, in its local frame.
    pub anchor_a: Vector2<f64>,
    /// Anchor on the second body, in its local frame.
    pub anchor_b: Vector2<f64>,
    /// Joint parameters.
    pub kind: JointKind,
}

impl JointDesc {
    /// A rigid distance joint; use [`with_softness`](Self::with_softness) to
    /// make it a spring.
    #[must_use]
    pub fn distance(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        length: f64,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Distance {
                length,
                frequency: 0.0,
                damping_ratio: 0.0,
            },
        }
    }

    /// A rope joint preventing the anchors from getting closer than
    /// `min_length`.
    #[must_use]
    pub fn rope(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        min_length: f64,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Rope { min_length },
        }
    }

    /// A rigid two-sided limit on the anchor distance.
    #[must_use]
    pub fn limit(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        min_length: f64,
        max_length: f64,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Limit {
                min_length,
                max_length,
            },
        }
    }

    /// A weld joint. The reference angle is taken from the bodies when the
    /// joint is added to a world.
    #[must_use]
    pub fn weld(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Weld {
                reference_angle: 0.0,
            },
        }
    }

    /// Set spring frequency and damping ratio (distance joints only).
    #[must_use]
    pub fn with_softness(mut self, frequency: f64, damping_ratio: f64) -> Self {
        if let JointKind::Distance { length, .. } = self.kind {
            self.kind = JointKind::Distance {
                length,
                frequency,
                damping_ratio,
            };
        }
        self
    }
}

/// A joint as stored in the world.
#[derive(Debug, Clone)]
pub(crate) struct Joint {
    pub a: usize,
    pub b: usize,
    pub anchor_a: Vector2<f64>,
    pub anchor_b: Vector2<f64>,
    pub kind: JointKind,
    lambda: f64,
    lambda_angular: f64,
}

impl Joint {
    pub fn new(desc: &JointDesc, bodies: &[Body]) -> Self {
        let (a, b) = (desc.body_a.index(), desc.body_b.index());
        let kind = match desc.kind {
            JointKind::Weld { .. } => JointKind::Weld {
                reference_angle: bodies[b].angle - bodies[a].angle,
            },
            other => other,
        };
        Self {
            a,
            b,
            anchor_a: desc.anchor_a,
            anchor_b: desc.anchor_b,
            kind,
            lambda: 0.0,
            lambda_angular: 0.0,
        }
    }

    /// Reset the Lagrange multipliers (call at start of each substep).
    pub fn reset(&mut self) {
        self.lambda = 0.0;
        self.lambda_angular = 0.0;
    }

    /// Solve this joint once, moving the two bodies.
    ///
    /// Returns the constraint error before the correction.
    pub fn solve(&mut self, bodies: &mut [Body], h: f64) -> f64 {
        if self.a == self.b {
            return 0.0;
        }
        let (ba, bb) = pair_mut(bodies, self.a, self.b);
        match self.kind {
            JointKind::Distance {
                length,
                frequency,
                damping_ratio,
            } => {
                let (alpha_tilde, gamma) = soft_coefficients(ba, bb, frequency, damping_ratio, h);
                let anchors = (self.anchor_a, self.anchor_b);
                solve_distance(ba, bb, anchors, length, alpha_tilde, gamma, &mut self.lambda)
            }
            JointKind::Rope { min_length } => {
                let distance = anchor_distance(ba, bb, &self.anchor_a, &self.anchor_b);
                if distance >= min_length {
                    return 0.0;
                }
                let anchors = (self.anchor_a, self.anchor_b);
                solve_distance(ba, bb, anchors, min_length, 0.0, 0.0, &mut self.lambda)
            }
            JointKind::Limit {
                min_length,
                max_length,
            } => {
                let distance = anchor_distance(ba, bb, &self.anchor_a, &self.anchor_b);
                let bound = if distance < min_length {
                    min_length
                } else if distance > max_length {
                    max_length
                } else {
                    return 0.0;
                };
                let anchors = (self.anchor_a, self.anchor_b);
                solve_distance(ba, bb, anchors, bound, 0.0, 0.0, &mut self.lambda)
            }
            JointKind::Weld { reference_angle } => {
                let anchors = (self.anchor_a, self.anchor_b);
                let error = solve_distance(ba, bb, anchors, 0.0, 0.0, 0.0, &mut self.lambda);
                let angular = solve_angle(ba, bb, reference_angle, &mut self.lambda_angular);
                error.max(angular)
            }
        }
    }
}

/// Mutable references to two distinct bodies.
fn pair_mut(bodies: &mut [Body], a: usize, b: usize) -> (&mut Body, &mut Body) {
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn anchor_distance(a: &Body, b: &Body, anchor_a: &Vector2<f64>, anchor_b: &Vector2<f64>) -> f64 {
    let pa = a.position + a.world_offset(anchor_a);
    let pb = b.position + b.world_offset(anchor_b);
    (pb - pa).norm()
}

/// Time-scaled compliance and damping for a spring of the given frequency
/// between two bodies. Zero frequency means rigid.
fn soft_coefficients(a: &Body, b: &Body, frequency: f64, damping_ratio: f64, h: f64) -> (f64, f64) {
    let w = a.inv_mass + b.inv_mass;
    if frequency <= 0.0 || w <= 0.0 {
        return (0.0, 0.0);
    }
    let effective_mass = 1.0 / w;
    let omega = 2.0 * std::f64::consts::PI * frequency;
    let stiffness = effective_mass * omega * omega;
    let damping = 2.0 * effective_mass * damping_ratio * omega;
    let alpha_tilde = 1.0 / (stiffness * h * h);
    let gamma = alpha_tilde * damping * h;
    (alpha_tilde, gamma)
}

/// XPBD distance constraint `C = |p_b - p_a| - length` between two anchors.
fn solve_distance(
    a: &mut Body,
    b: &mut Body,
    anchors: (Vector2<f64>, Vector2<f64>),
    length: f64,
    alpha_tilde: f64,
    gamma: f64,
    lambda: &mut f64,
) -> f64 {
    let ra = a.world_offset(&anchors.0);
    let rb = b.world_offset(&anchors.1);
    let pa = a.position + ra;
    let pb = b.position + rb;
    let diff = pb - pa;
    let distance = diff.norm();

    // Degenerate direction: nothing meaningful to push along
    if distance < 1e-10 {
        return 0.0;
    }

    let c = distance - length;
    let n = diff / distance;
    let w_sum = a.generalized_inverse_mass(&ra, &n) + b.generalized_inverse_mass(&rb, &n);
    if w_sum < 1e-12 {
        return 0.0;
    }

    // Relative anchor motion during this substep, for damping
    let motion = (pb - b.prev_world_point(&anchors.1)) - (pa - a.prev_world_point(&anchors.0));
    let relative = n.dot(&motion);

    let delta_lambda =
        (-c - alpha_tilde * *lambda - gamma * relative) / ((1.0 + gamma) * w_sum + alpha_tilde);
    *lambda += delta_lambda;

    let p = n * delta_lambda;
    a.apply_correction(&ra, &(-p));
    b.apply_correction(&rb, &p);

    c.abs()
}

/// Rigid angular constraint `C = (θ_b - θ_a) - reference`.
fn solve_angle(a: &mut Body, b: &mut Body, reference: f64, lambda: &mut f64) -> f64 {
    let w_sum = a.inv_inertia + b.inv_inertia;
    if w_sum < 1e-12 {
        return 0.0;
    }
    let c = (b.angle - a.angle) - reference;
    let delta_lambda = -c / w_sum;
    *lambda += delta_lambda;
    a.angle -= a.inv_inertia * delta_lambda;
    b.angle += b.inv_inertia * delta_lambda;
    c.abs()
}
