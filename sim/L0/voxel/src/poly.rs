//! Immutable voxel snapshots.

use std::collections::BTreeMap;

use nalgebra::{Point2, Vector2};
use sim_types::{area, vertex_mean, BoundingBox};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::breakage::{Component, Malfunction};

/// State of a voxel at one instant, detached from the physics world.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelPoly {
    /// Outer corners, counter-clockwise from south-west.
    pub vertices: [Point2<f64>; 4],
    /// Orientation of the vertical sides (`π/2` when upright).
    pub angle: f64,
    /// Mean linear velocity of the corner masses.
    pub linear_velocity: Vector2<f64>,
    /// Whether any corner mass touched the ground.
    pub touching_ground: bool,
    /// Area over rest area.
    pub area_ratio: f64,
    /// Cumulative area-ratio energy.
    pub area_ratio_energy: f64,
    /// Last actuation value applied.
    pub last_applied_force: f64,
    /// Cumulative control energy.
    pub control_energy: f64,
    /// Component states; empty for voxels that cannot break.
    pub malfunctions: BTreeMap<Component, Malfunction>,
}

impl VoxelPoly {
    /// Mean of the vertices.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        vertex_mean(&self.vertices).unwrap_or_else(Point2::origin)
    }

    /// Bounding box of the vertices.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let [first, ..] = self.vertices;
        BoundingBox::from_points(&self.vertices).unwrap_or(BoundingBox::new(first, first))
    }

    /// Polygon area.
    #[must_use]
    pub fn area(&self) -> f64 {
        area(&self.vertices)
    }

    /// Whether any component is malfunctioning.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.malfunctions.values().any(|m| *m != Malfunction::None)
    }
}
