//! Result of a locomotion run and the metrics derived from it.

use nalgebra::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::footprint::{compute_footprint, quantize_footprints, Footprint};
use crate::gait::{compute_gaits, Gait};
use crate::observation::Observation;
use crate::spectrum::{spectrum, SpectrumBin};

/// Shortest footprint sequence considered a gait.
pub const MIN_GAIT_LENGTH: usize = 2;

/// Time-ordered observations of a run.
///
/// Scalar metrics return `None` when the outcome has too few observations
/// to define them.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outcome {
    observations: Vec<(f64, Observation)>,
}

impl Outcome {
    /// Build an outcome; observations are sorted by time.
    #[must_use]
    pub fn new(observations: impl IntoIterator<Item = (f64, Observation)>) -> Self {
        let mut observations: Vec<_> = observations.into_iter().collect();
        observations.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { observations }
    }

    /// Observations in time order.
    #[must_use]
    pub fn observations(&self) -> &[(f64, Observation)] {
        &self.observations
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether there are no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    fn first(&self) -> Option<&(f64, Observation)> {
        self.observations.first()
    }

    fn last(&self) -> Option<&(f64, Observation)> {
        self.observations.last()
    }

    /// Time between the first and last observation.
    #[must_use]
    pub fn time_span(&self) -> Option<f64> {
        Some(self.last()?.0 - self.first()?.0)
    }

    /// Observations with `start <= t <= end`.
    #[must_use]
    pub fn sub_outcome(&self, start: f64, end: f64) -> Outcome {
        Outcome {
            observations: self
                .observations
                .iter()
                .filter(|(t, _)| *t >= start && *t <= end)
                .cloned()
                .collect(),
        }
    }

    /// Centroid of the robot at each observation.
    #[must_use]
    pub fn center_trajectory(&self) -> Vec<(f64, Point2<f64>)> {
        self.observations
            .iter()
            .filter_map(|(t, o)| Some((*t, o.center()?)))
            .collect()
    }

    /// Horizontal displacement of the centroid, last minus first.
    #[must_use]
    pub fn distance(&self) -> Option<f64> {
        let first = self.first()?.1.center()?;
        let last = self.last()?.1.center()?;
        Some(last.x - first.x)
    }

    /// Distance over time span.
    #[must_use]
    pub fn velocity(&self) -> Option<f64> {
        let span = self.time_span()?;
        (span > 0.0).then_some(self.distance()? / span)
    }

    /// Control energy spent during the outcome.
    #[must_use]
    pub fn control_energy(&self) -> Option<f64> {
        Some(self.last()?.1.control_energy() - self.first()?.1.control_energy())
    }

    /// Area-ratio energy accumulated during the outcome.
    #[must_use]
    pub fn area_ratio_energy(&self) -> Option<f64> {
        Some(self.last()?.1.area_ratio_energy() - self.first()?.1.area_ratio_energy())
    }

    /// Control energy per unit time.
    #[must_use]
    pub fn control_power(&self) -> Option<f64> {
        let span = self.time_span()?;
        (span > 0.0).then_some(self.control_energy()? / span)
    }

    /// Distance penalized by the control energy spent:
    /// `distance / (1 + control_power · time_span)`.
    #[must_use]
    pub fn corrected_efficiency(&self) -> Option<f64> {
        let span = self.time_span()?;
        let power = self.control_power()?;
        Some(self.distance()? / (1.0 + power * span))
    }

    /// Mean over observations of the fraction of broken voxels.
    #[must_use]
    pub fn average_broken_ratio(&self) -> Option<f64> {
        (!self.is_empty()).then(|| {
            self.observations.iter().map(|(_, o)| o.broken_ratio()).sum::<f64>() / self.len() as f64
        })
    }

    /// Wall-clock seconds the run took, as recorded by the last observation.
    #[must_use]
    pub fn compute_time(&self) -> Option<f64> {
        Some(self.last()?.1.compute_time - self.first()?.1.compute_time)
    }

    fn sampling_step(&self) -> Option<f64> {
        let span = self.time_span()?;
        (self.len() > 1).then(|| span / (self.len() - 1) as f64)
    }

    fn signal_spectrum(&self, n_bins: usize, signal: impl Fn(&Observation) -> Option<f64>) -> Vec<SpectrumBin> {
        let Some(dt) = self.sampling_step() else {
            return Vec::new();
        };
        let values: Vec<f64> = self.observations.iter().filter_map(|(_, o)| signal(o)).collect();
        spectrum(&values, dt, n_bins)
    }

    /// Spectrum of the centroid's horizontal velocity.
    #[must_use]
    pub fn x_velocity_spectrum(&self, n_bins: usize) -> Vec<SpectrumBin> {
        self.signal_spectrum(n_bins, |o| o.velocity().map(|v| v.x))
    }

    /// Spectrum of the centroid's vertical velocity.
    #[must_use]
    pub fn y_velocity_spectrum(&self, n_bins: usize) -> Vec<SpectrumBin> {
        self.signal_spectrum(n_bins, |o| o.velocity().map(|v| v.y))
    }

    /// Spectrum of the mean voxel orientation.
    #[must_use]
    pub fn angle_spectrum(&self, n_bins: usize) -> Vec<SpectrumBin> {
        self.signal_spectrum(n_bins, Observation::angle)
    }

    /// One spectrum per footprint slice, of the 0/1 contact signal.
    #[must_use]
    pub fn footprint_spectra(&self, n_slices: usize, n_bins: usize) -> Vec<Vec<SpectrumBin>> {
        let Some(dt) = self.sampling_step() else {
            return Vec::new();
        };
        let footprints = self.footprints(n_slices);
        (0..n_slices)
            .map(|i| {
                let values: Vec<f64> = footprints
                    .iter()
                    .map(|(_, f)| if f.mask()[i] { 1.0 } else { 0.0 })
                    .collect();
                spectrum(&values, dt, n_bins)
            })
            .collect()
    }

    /// Footprint over `n` slices at every observation.
    #[must_use]
    pub fn footprints(&self, n: usize) -> Vec<(f64, Footprint)> {
        self.observations
            .iter()
            .map(|(t, o)| (*t, compute_footprint(&o.voxel_polys, n)))
            .collect()
    }

    /// Footprints majority-voted into buckets of width `interval`.
    #[must_use]
    pub fn quantized_footprints(&self, interval: f64, n: usize) -> Vec<(f64, Footprint)> {
        quantize_footprints(&self.footprints(n), interval)
    }

    /// Gaits of length `[min_len, max_len]` over footprints quantized at
    /// `interval`, best first.
    #[must_use]
    pub fn gaits(&self, interval: f64, n: usize, min_len: usize, max_len: usize) -> Vec<Gait> {
        compute_gaits(&self.quantized_footprints(interval, n), min_len, max_len, interval)
    }

    /// Best gait, searching sequences up to half the number of buckets long.
    #[must_use]
    pub fn main_gait(&self, interval: f64, n: usize) -> Option<Gait> {
        let quantized = self.quantized_footprints(interval, n);
        let max_len = (quantized.len() / 2).max(MIN_GAIT_LENGTH);
        compute_gaits(&quantized, MIN_GAIT_LENGTH, max_len, interval)
            .into_iter()
            .next()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;
    use sim_types::Grid;
    use sim_voxel::VoxelPoly;
    use std::collections::BTreeMap;

    fn observation(x: f64, energy: f64, touching: bool) -> Observation {
        let poly = VoxelPoly {
            vertices: [
                Point2::new(x, 0.0),
                Point2::new(x + 1.0, 0.0),
                Point2::new(x + 1.0, 1.0),
                Point2::new(x, 1.0),
            ],
            angle: std::f64::consts::FRAC_PI_2,
            linear_velocity: Vector2::new(1.0, 0.0),
            touching_ground: touching,
            area_ratio: 1.0,
            area_ratio_energy: 0.0,
            last_applied_force: 0.0,
            control_energy: energy,
            malfunctions: BTreeMap::new(),
        };
        Observation::new(Grid::filled(1, 1, Some(poly)), 0.0, 0.0)
    }

    fn moving(n: usize) -> Outcome {
        Outcome::new((0..n).map(|i| {
            let t = i as f64 * 0.1;
            (t, observation(t, 2.0 * t, i % 4 < 2))
        }))
    }

    #[test]
    fn test_metrics() {
        let outcome = moving(11);
        assert_relative_eq!(outcome.distance().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.velocity().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.control_energy().unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.control_power().unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.corrected_efficiency().unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.average_broken_ratio().unwrap(), 0.0);
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = Outcome::default();
        assert!(outcome.distance().is_none());
        assert!(outcome.velocity().is_none());
        assert!(outcome.average_broken_ratio().is_none());
        assert!(outcome.x_velocity_spectrum(4).is_empty());
        assert!(outcome.footprints(4).is_empty());
        assert!(outcome.main_gait(0.5, 4).is_none());
    }

    #[test]
    fn test_sorted_and_sliced() {
        let outcome = Outcome::new(vec![(1.0, observation(1.0, 0.0, true)), (0.0, observation(0.0, 0.0, true))]);
        assert_relative_eq!(outcome.observations()[0].0, 0.0);
        let sub = moving(11).sub_outcome(0.25, 0.55);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.center_trajectory().len(), 3);
    }

    #[test]
    fn test_alternating_contact_gait() {
        // Contact toggles every 0.2 s
        let outcome = moving(80);
        let gait = outcome.main_gait(0.2, 2).unwrap();
        assert!((0.0..=1.0).contains(&gait.purity));
        assert_relative_eq!(gait.mode_interval, 0.4, epsilon = 1e-6);
        assert_eq!(outcome.footprint_spectra(2, 4).len(), 2);
    }
}
