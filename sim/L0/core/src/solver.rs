//! XPBD substep solver for the 2D world.
//!
//! # Algorithm Overview
//!
//! ```text
//! For each substep of size h:
//!   1. Reset Lagrange multipliers
//!   2. Integrate: v += h (g + F/m), apply damping, x* = x + h v
//!   3. For each iteration:
//!      a. Solve joints (distance, rope, limit, weld)
//!      b. Solve terrain contacts
//!   4. Update velocities: v = (x - x_prev) / h
//! ```

use nalgebra::Vector2;
use sim_types::{TerrainProfile, WorldSettings};

use crate::body::Body;
use crate::contact::{solve_terrain_contacts, ContactStats};
use crate::joint::Joint;

/// Statistics from the last world step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    /// Number of substeps performed.
    pub num_substeps: u32,
    /// Largest joint error seen in the last iteration.
    pub max_joint_error: f64,
    /// Terrain contacts resolved over the whole step.
    pub contacts: ContactStats,
    /// Total kinetic energy after the step.
    pub kinetic_energy: f64,
}

/// Advance bodies by one full step of `settings.step_size`.
pub(crate) fn step(
    bodies: &mut [Body],
    joints: &mut [Joint],
    terrain: Option<&TerrainProfile>,
    settings: &WorldSettings,
) -> StepStats {
    let substeps = settings.num_substeps.max(1);
    let h = settings.substep_size();
    let mut stats = StepStats {
        num_substeps: substeps,
        ..StepStats::default()
    };

    for body in bodies.iter_mut() {
        body.touching_ground = false;
    }

    for _ in 0..substeps {
        stats.max_joint_error = substep(bodies, joints, terrain, settings, h, &mut stats.contacts);
    }

    for body in bodies.iter_mut() {
        body.force = Vector2::zeros();
    }

    stats.kinetic_energy = kinetic_energy(bodies);
    stats
}

fn substep(
    bodies: &mut [Body],
    joints: &mut [Joint],
    terrain: Option<&TerrainProfile>,
    settings: &WorldSettings,
    h: f64,
    contacts: &mut ContactStats,
) -> f64 {
    for joint in joints.iter_mut() {
        joint.reset();
    }

    // 1. Predict
    for body in bodies.iter_mut().filter(|b| b.is_dynamic()) {
        body.velocity += (settings.gravity + body.force * body.inv_mass) * h;
        body.velocity /= 1.0 + h * body.linear_damping;
        body.angular_velocity /= 1.0 + h * body.angular_damping;

        body.prev_position = body.position;
        body.prev_angle = body.angle;
        body.position += body.velocity * h;
        body.angle += body.angular_velocity * h;
    }

    // 2. Project constraints
    let mut max_error: f64 = 0.0;
    for _ in 0..settings.num_iterations.max(1) {
        max_error = 0.0;
        for joint in joints.iter_mut() {
            max_error = max_error.max(joint.solve(bodies, h));
        }
        if let Some(terrain) = terrain {
            for body in bodies.iter_mut() {
                solve_terrain_contacts(
                    body,
                    terrain,
                    settings.friction,
                    settings.contact_slop,
                    contacts,
                );
            }
        }
    }

    // 3. Derive velocities
    for body in bodies.iter_mut().filter(|b| b.is_dynamic()) {
        body.velocity = (body.position - body.prev_position) / h;
        body.angular_velocity = (body.angle - body.prev_angle) / h;

        let speed = body.velocity.norm();
        if speed > settings.max_velocity {
            body.velocity *= settings.max_velocity / speed;
        }
    }

    max_error
}

fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .filter(|b| b.is_dynamic())
        .map(|b| {
            let linear = 0.5 * b.velocity.norm_squared() / b.inv_mass;
            let angular = if b.inv_inertia > 0.0 {
                0.5 * b.angular_velocity * b.angular_velocity / b.inv_inertia
            } else {
                0.0
            };
            linear + angular
        })
        .sum()
}
