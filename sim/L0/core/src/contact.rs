//! Body/terrain contact.
//!
//! Each body corner is tested against the terrain height directly beneath
//! it. Penetrating corners are pushed out along the local surface normal and
//! tangential slip is limited by a Coulomb cone on the positional impulses:
//!
//! ```text
//! Δλ_n = d / w_n
//! |Δλ_t| ≤ μ · Δλ_n
//! ```

use sim_types::TerrainProfile;

use crate::body::Body;

/// Per-substep contact statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactStats {
    /// Number of penetrating corners resolved.
    pub num_contacts: usize,
    /// Deepest penetration found.
    pub max_penetration: f64,
}

/// Resolve terrain contacts of one body, updating its ground-touch flag.
pub(crate) fn solve_terrain_contacts(
    body: &mut Body,
    terrain: &TerrainProfile,
    friction: f64,
    slop: f64,
    stats: &mut ContactStats,
) {
    if !body.is_dynamic() {
        return;
    }
    for local in body.local_corners() {
        let r = body.world_offset(&local);
        let p = body.position + r;
        let ground = terrain.y_at(p.x);
        let n = terrain.normal_at(p.x);
        let depth = (ground - p.y) * n.y;

        if depth > -slop {
            body.touching_ground = true;
        }
        if depth <= 0.0 {
            continue;
        }

        stats.num_contacts += 1;
        stats.max_penetration = stats.max_penetration.max(depth);

        // Normal correction
        let w_n = body.generalized_inverse_mass(&r, &n);
        if w_n < 1e-12 {
            continue;
        }
        let lambda_n = depth / w_n;
        body.apply_correction(&r, &(n * lambda_n));

        // Friction on the corner's tangential motion during this substep
        let r = body.world_offset(&local);
        let motion = (body.position + r) - body.prev_world_point(&local);
        let tangential = motion - n * n.dot(&motion);
        let slip = tangential.norm();
        if slip < 1e-12 {
            continue;
        }
        let t = tangential / slip;
        let w_t = body.generalized_inverse_mass(&r, &t);
        let lambda_t = (slip / w_t).min(friction * lambda_n);
        body.apply_correction(&r, &(-t * lambda_t));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::BodyDesc;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn flat() -> TerrainProfile {
        TerrainProfile::new(vec![-100.0, 100.0], vec![0.0, 0.0]).unwrap()
    }

    #[test]
    fn test_penetration_resolved() {
        let mut body = Body::from_desc(&BodyDesc::square(Point2::new(0.0, 0.4), 1.0, 1.0));
        body.prev_position = body.position;
        let mut stats = ContactStats::default();
        solve_terrain_contacts(&mut body, &flat(), 1.0, 0.01, &mut stats);
        assert!(body.touching_ground);
        assert_eq!(stats.num_contacts, 2);
        // The first correction tilts the body, deepening the second corner
        assert!(stats.max_penetration >= 0.1 - 1e-12);
        assert!(body.position.y > 0.4);
    }

    #[test]
    fn test_clear_of_ground() {
        let mut body = Body::from_desc(&BodyDesc::square(Point2::new(0.0, 3.0), 1.0, 1.0));
        let mut stats = ContactStats::default();
        solve_terrain_contacts(&mut body, &flat(), 1.0, 0.01, &mut stats);
        assert!(!body.touching_ground);
        assert_eq!(stats.num_contacts, 0);
        assert_relative_eq!(body.position.y, 3.0);
    }

    #[test]
    fn test_friction_limits_slip() {
        let mut sticky = Body::from_desc(&BodyDesc::square(Point2::new(0.0, 0.45), 1.0, 1.0));
        sticky.prev_position = Point2::new(-0.01, 0.45);
        let mut slippery = sticky.clone();

        let mut stats = ContactStats::default();
        solve_terrain_contacts(&mut sticky, &flat(), 10.0, 0.01, &mut stats);
        solve_terrain_contacts(&mut slippery, &flat(), 0.0, 0.01, &mut stats);

        assert!(sticky.position.x < slippery.position.x);
        assert_relative_eq!(slippery.position.x, 0.0, epsilon = 1e-12);
    }
}
