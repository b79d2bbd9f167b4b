//! Binned magnitude spectra.

use num_complex::Complex64;
use rustfft::FftPlanner;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean spectral magnitude over a frequency band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpectrumBin {
    /// Lower band edge (Hz).
    pub min_frequency: f64,
    /// Upper band edge (Hz).
    pub max_frequency: f64,
    /// Mean normalized magnitude `|X_k| / N` of the band's coefficients.
    pub magnitude: f64,
}

/// Magnitude spectrum of `values` sampled every `dt` seconds, averaged
/// into `n_bins` equal-width bands over `[0, 1 / (2 dt)]`.
///
/// The signal is zero-padded to the next power of two. Returns an empty
/// vector when there are no samples, no bins or `dt` is not positive.
#[must_use]
pub fn spectrum(values: &[f64], dt: f64, n_bins: usize) -> Vec<SpectrumBin> {
    if values.is_empty() || n_bins == 0 || !(dt > 0.0) {
        return Vec::new();
    }
    let n = values.len().next_power_of_two();
    let mut data: Vec<Complex64> = values.iter().map(|v| Complex64::new(*v, 0.0)).collect();
    data.resize(n, Complex64::new(0.0, 0.0));
    FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut data);

    let nyquist = 0.5 / dt;
    let width = nyquist / n_bins as f64;
    let mut sums = vec![0.0; n_bins];
    let mut counts = vec![0_usize; n_bins];
    for (k, x) in data.iter().enumerate().take(n / 2 + 1) {
        let frequency = k as f64 / (n as f64 * dt);
        let bin = ((frequency / width) as usize).min(n_bins - 1);
        sums[bin] += x.norm() / n as f64;
        counts[bin] += 1;
    }

    (0..n_bins)
        .map(|i| SpectrumBin {
            min_frequency: i as f64 * width,
            max_frequency: (i + 1) as f64 * width,
            magnitude: if counts[i] > 0 {
                sums[i] / counts[i] as f64
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    /// Direct DFT magnitudes `|X_k| / N` for `k <= N / 2`.
    fn dft_magnitudes(values: &[f64]) -> Vec<f64> {
        let n = values.len();
        (0..=n / 2)
            .map(|k| {
                let x: Complex64 = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Complex64::from_polar(*v, -TAU * (k * i) as f64 / n as f64))
                    .sum();
                x.norm() / n as f64
            })
            .collect()
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut values = vec![0.0; 8];
        values[0] = 1.0;
        // One coefficient per band: 5 coefficients for k = 0..=4
        let bins = spectrum(&values, 1.0, 5);
        for bin in &bins {
            assert_relative_eq!(bin.magnitude, 1.0 / 8.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bins_match_dft() {
        let signal: Vec<f64> = (0..16).map(|i| (i as f64 * 0.7).sin() + 0.3 * i as f64).collect();
        let expected = dft_magnitudes(&signal);
        // dt = 1 and 16 samples: band width 1/16 Hz puts bin k on coefficient
        // k, and the Nyquist coefficient joins the last band
        let bins = spectrum(&signal, 1.0, 8);
        assert_eq!(bins.len(), 8);
        for (k, bin) in bins.iter().enumerate().take(7) {
            assert_relative_eq!(bin.magnitude, expected[k], epsilon = 1e-9);
        }
        assert_relative_eq!(bins[7].magnitude, 0.5 * (expected[7] + expected[8]), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_padding_to_power_of_two() {
        let signal: Vec<f64> = (0..12).map(|i| (i as f64 * 1.3).cos()).collect();
        let mut padded = signal.clone();
        padded.resize(16, 0.0);
        let expected = dft_magnitudes(&padded);
        let bins = spectrum(&signal, 1.0, 8);
        assert_relative_eq!(bins[3].magnitude, expected[3], epsilon = 1e-9);
        assert_relative_eq!(bins[0].magnitude, expected[0], epsilon = 1e-9);
    }

    #[test]
    fn test_sine_peak() {
        let dt = 1.0 / 64.0;
        let values: Vec<f64> = (0..256).map(|i| (TAU * 4.0 * i as f64 * dt).sin()).collect();
        let bins = spectrum(&values, dt, 16);
        assert_eq!(bins.len(), 16);
        assert_relative_eq!(bins[15].max_frequency, 32.0);
        let peak = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.magnitude.total_cmp(&b.1.magnitude))
            .map(|(i, _)| i)
            .unwrap();
        // 4 Hz falls in the [4, 6) band
        assert_eq!(peak, 2);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(spectrum(&[], 0.1, 4).is_empty());
        assert!(spectrum(&[1.0], 0.1, 0).is_empty());
        assert!(spectrum(&[1.0], 0.0, 4).is_empty());
    }
}
