//! Per-step observations and the snapshot listener.

use nalgebra::{Point2, Vector2};
use sim_types::{BoundingBox, Grid};
use sim_voxel::VoxelPoly;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// State of the robot and its surroundings at one recorded step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Snapshot of every voxel; empty cells stay empty.
    pub voxel_polys: Grid<Option<VoxelPoly>>,
    /// Terrain height under the robot's center.
    pub terrain_height: f64,
    /// Wall-clock seconds spent in the run so far.
    pub compute_time: f64,
}

impl Observation {
    /// Create an observation.
    #[must_use]
    pub fn new(voxel_polys: Grid<Option<VoxelPoly>>, terrain_height: f64, compute_time: f64) -> Self {
        Self {
            voxel_polys,
            terrain_height,
            compute_time,
        }
    }

    /// Populated snapshots.
    pub fn polys(&self) -> impl Iterator<Item = &VoxelPoly> {
        self.voxel_polys.occupied().map(|(_, _, p)| p)
    }

    /// Number of populated snapshots.
    #[must_use]
    pub fn num_voxels(&self) -> usize {
        self.voxel_polys.count_occupied()
    }

    /// Unweighted centroid of the voxel polygon centers.
    #[must_use]
    pub fn center(&self) -> Option<Point2<f64>> {
        let n = self.num_voxels();
        (n > 0).then(|| {
            let sum = self.polys().fold(Vector2::zeros(), |acc, p| acc + p.center().coords);
            Point2::from(sum / n as f64)
        })
    }

    /// Mean voxel velocity.
    #[must_use]
    pub fn velocity(&self) -> Option<Vector2<f64>> {
        let n = self.num_voxels();
        (n > 0).then(|| self.polys().fold(Vector2::zeros(), |acc, p| acc + p.linear_velocity) / n as f64)
    }

    /// Mean voxel orientation.
    #[must_use]
    pub fn angle(&self) -> Option<f64> {
        let n = self.num_voxels();
        (n > 0).then(|| self.polys().map(|p| p.angle).sum::<f64>() / n as f64)
    }

    /// Union of the voxel bounding boxes.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.polys()
            .map(VoxelPoly::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Sum of the voxels' cumulative control energies.
    #[must_use]
    pub fn control_energy(&self) -> f64 {
        self.polys().map(|p| p.control_energy).sum()
    }

    /// Sum of the voxels' cumulative area-ratio energies.
    #[must_use]
    pub fn area_ratio_energy(&self) -> f64 {
        self.polys().map(|p| p.area_ratio_energy).sum()
    }

    /// Fraction of voxels with a malfunctioning component.
    #[must_use]
    pub fn broken_ratio(&self) -> f64 {
        let n = self.num_voxels();
        if n == 0 {
            return 0.0;
        }
        self.polys().filter(|p| p.is_broken()).count() as f64 / n as f64
    }
}

/// Receives one snapshot per simulated step.
///
/// Called from inside the simulation loop; implementations should return
/// quickly.
pub trait SnapshotListener {
    /// Handle the observation recorded at time `t`.
    fn on_snapshot(&mut self, t: f64, observation: &Observation);
}

impl<F> SnapshotListener for F
where
    F: FnMut(f64, &Observation),
{
    fn on_snapshot(&mut self, t: f64, observation: &Observation) {
        self(t, observation);
    }
}
