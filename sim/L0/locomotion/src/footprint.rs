//! Ground-contact footprints.
//!
//! A footprint splits the robot's horizontal extent into `n` equal slices
//! and marks the slices under a voxel that touches the ground:
//!
//! ```text
//!   ┌──┐┌──┐┌──┐┌──┐
//!   │▒▒││  ││  ││▒▒│      ▒ touching
//!   └──┘└──┘└──┘└──┘
//!   1 1 1 0 0 1 1 1        n = 8
//! ```

use std::fmt;

use sim_types::Grid;
use sim_voxel::VoxelPoly;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A ground-contact mask over `n` horizontal slices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Footprint {
    mask: Vec<bool>,
}

impl Footprint {
    /// Create a footprint from a mask.
    #[must_use]
    pub fn new(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    /// Whether the footprint has no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// The mask.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of touching slices.
    #[must_use]
    pub fn count_touching(&self) -> usize {
        self.mask.iter().filter(|b| **b).count()
    }
}

impl fmt::Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for touching in &self.mask {
            f.write_str(if *touching { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Footprint of one instant over `n` slices of the robot's horizontal
/// extent.
#[must_use]
pub fn compute_footprint(polys: &Grid<Option<VoxelPoly>>, n: usize) -> Footprint {
    let mut mask = vec![false; n];
    let boxes: Vec<_> = polys
        .occupied()
        .map(|(_, _, p)| (p.bounding_box(), p.touching_ground))
        .collect();
    let Some(extent) = boxes.iter().map(|(bb, _)| *bb).reduce(|a, b| a.union(&b)) else {
        return Footprint::new(mask);
    };
    if n == 0 {
        return Footprint::new(mask);
    }

    let width = extent.width();
    let last = (n - 1) as f64;
    let index = |x: f64| -> usize {
        if width <= 0.0 {
            return 0;
        }
        (((x - extent.min.x) / width * last).round().clamp(0.0, last)) as usize
    };
    for (bb, touching) in boxes {
        if touching {
            for slot in &mut mask[index(bb.min.x)..=index(bb.max.x)] {
                *slot = true;
            }
        }
    }
    Footprint::new(mask)
}

/// Majority-vote footprints into consecutive buckets of width `interval`.
///
/// Input must be sorted by time. Each output entry is keyed by its
/// bucket's start time; a slice is set when more than half of the
/// footprints in the bucket have it set. Buckets without footprints are
/// skipped.
#[must_use]
pub fn quantize_footprints(footprints: &[(f64, Footprint)], interval: f64) -> Vec<(f64, Footprint)> {
    let Some(&(t0, _)) = footprints.first() else {
        return Vec::new();
    };
    if !(interval > 0.0) {
        return Vec::new();
    }
    let bucket_of = |t: f64| ((t - t0) / interval + 1e-9).floor() as i64;

    let mut quantized = Vec::new();
    let mut start = 0;
    while start < footprints.len() {
        let bucket = bucket_of(footprints[start].0);
        let end = footprints[start..]
            .iter()
            .position(|(t, _)| bucket_of(*t) != bucket)
            .map_or(footprints.len(), |i| start + i);
        let members = &footprints[start..end];
        let n = members.iter().map(|(_, f)| f.len()).max().unwrap_or(0);
        let mask = (0..n)
            .map(|i| {
                let votes = members
                    .iter()
                    .filter(|(_, f)| f.mask().get(i).copied().unwrap_or(false))
                    .count();
                votes * 2 > members.len()
            })
            .collect();
        quantized.push((t0 + bucket as f64 * interval, Footprint::new(mask)));
        start = end;
    }
    quantized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};
    use std::collections::BTreeMap;

    fn poly(x: f64, touching: bool) -> VoxelPoly {
        VoxelPoly {
            vertices: [
                Point2::new(x, 0.0),
                Point2::new(x + 1.0, 0.0),
                Point2::new(x + 1.0, 1.0),
                Point2::new(x, 1.0),
            ],
            angle: std::f64::consts::FRAC_PI_2,
            linear_velocity: Vector2::zeros(),
            touching_ground: touching,
            area_ratio: 1.0,
            area_ratio_energy: 0.0,
            last_applied_force: 0.0,
            control_energy: 0.0,
            malfunctions: BTreeMap::new(),
        }
    }

    fn row(touching: &[bool]) -> Grid<Option<VoxelPoly>> {
        Grid::from_fn(touching.len(), 1, |x, _| Some(poly(x as f64, touching[x])))
    }

    #[test]
    fn test_footprint_marks_touching_voxels() {
        let footprint = compute_footprint(&row(&[true, false, false, true]), 8);
        assert_eq!(footprint.len(), 8);
        // Voxel 0 spans slices 0..=round(1.75), voxel 3 spans round(5.25)..=7
        assert_eq!(footprint.to_string(), "11100111");
    }

    #[test]
    fn test_footprint_rounds_edges_to_nearest_slice() {
        let left = compute_footprint(&row(&[true, false, false, false]), 8);
        assert_eq!(left.to_string(), "11100000");
        let right = compute_footprint(&row(&[false, false, false, true]), 8);
        assert_eq!(right.to_string(), "00000111");
        // Inner voxel 1 spans [1.75, 3.5]: rounds to slices 2..=4
        let inner = compute_footprint(&row(&[false, true, false, false]), 8);
        assert_eq!(inner.to_string(), "00111000");
    }

    #[test]
    fn test_footprint_of_empty_body() {
        let polys: Grid<Option<VoxelPoly>> = Grid::from_fn(2, 2, |_, _| None);
        let footprint = compute_footprint(&polys, 5);
        assert_eq!(footprint.len(), 5);
        assert_eq!(footprint.count_touching(), 0);
    }

    #[test]
    fn test_majority_vote() {
        let a = Footprint::new(vec![true, false]);
        let b = Footprint::new(vec![true, true]);
        let c = Footprint::new(vec![false, true]);
        let footprints = vec![
            (0.0, a.clone()),
            (0.1, a.clone()),
            (0.2, b.clone()),
            (0.5, c.clone()),
            (0.6, b),
        ];
        let quantized = quantize_footprints(&footprints, 0.5);
        assert_eq!(quantized.len(), 2);
        assert_eq!(quantized[0], (0.0, Footprint::new(vec![true, false])));
        // Ties are not a majority
        assert_eq!(quantized[1], (0.5, Footprint::new(vec![false, true])));
    }

    #[test]
    fn test_quantize_empty() {
        assert!(quantize_footprints(&[], 1.0).is_empty());
    }
}
