//! Robot controllers.
//!
//! A controller is invoked once per simulated step with the voxel grid and
//! is expected to call [`Voxel::apply_force`] on the voxels it drives.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use sim_types::Grid;
use sim_voxel::Voxel;

/// A pluggable control strategy.
pub trait Controller: fmt::Debug + Send {
    /// `(width, height)` of the voxel grid this controller drives.
    fn grid_size(&self) -> (usize, usize);

    /// Read sensors and command actuation at time `t`.
    fn control(&mut self, t: f64, voxels: &mut Grid<Option<Voxel>>);

    /// Clear any internal state.
    fn reset(&mut self) {}
}

/// Actuation as a function of time.
pub type TimeFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Drives every voxel with its own function of time.
#[derive(Clone)]
pub struct TimeFunctions {
    functions: Grid<Option<TimeFunction>>,
}

impl TimeFunctions {
    /// Create a controller from a grid of functions; empty cells are left
    /// undriven.
    #[must_use]
    pub fn new(functions: Grid<Option<TimeFunction>>) -> Self {
        Self { functions }
    }

    /// Drive every cell of a `w × h` grid with the same function.
    #[must_use]
    pub fn uniform(w: usize, h: usize, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        let f: TimeFunction = Arc::new(f);
        Self::new(Grid::from_fn(w, h, |_, _| Some(Arc::clone(&f))))
    }

    /// A controller that always commands zero.
    #[must_use]
    pub fn zero(w: usize, h: usize) -> Self {
        Self::uniform(w, h, |_| 0.0)
    }
}

impl fmt::Debug for TimeFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeFunctions")
            .field("size", &self.functions.size())
            .field("driven", &self.functions.count_occupied())
            .finish()
    }
}

impl Controller for TimeFunctions {
    fn grid_size(&self) -> (usize, usize) {
        self.functions.size()
    }

    fn control(&mut self, t: f64, voxels: &mut Grid<Option<Voxel>>) {
        for (x, y, voxel) in voxels.occupied_mut() {
            if let Some(Some(f)) = self.functions.get(x, y) {
                voxel.apply_force(f(t));
            }
        }
    }
}

/// Sinusoidal actuation with a shared frequency and amplitude and a
/// per-voxel phase:
///
/// ```text
/// f(t) = amplitude · sin(2π · frequency · t + phase)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSin {
    frequency: f64,
    amplitude: f64,
    phases: Grid<Option<f64>>,
}

impl PhaseSin {
    /// Create a controller; empty cells are left undriven.
    #[must_use]
    pub fn new(frequency: f64, amplitude: f64, phases: Grid<Option<f64>>) -> Self {
        Self {
            frequency,
            amplitude,
            phases,
        }
    }

    /// Build the phase grid by calling `phase(x, y)` for every cell.
    #[must_use]
    pub fn from_fn(
        w: usize,
        h: usize,
        frequency: f64,
        amplitude: f64,
        mut phase: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        Self::new(frequency, amplitude, Grid::from_fn(w, h, |x, y| Some(phase(x, y))))
    }

    /// Frequency (Hz).
    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Amplitude.
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Actuation value for the voxel at `(x, y)` at time `t`.
    #[must_use]
    pub fn value(&self, x: usize, y: usize, t: f64) -> Option<f64> {
        let phase = (*self.phases.get(x, y)?)?;
        Some(self.amplitude * (TAU * self.frequency * t + phase).sin())
    }
}

impl Controller for PhaseSin {
    fn grid_size(&self) -> (usize, usize) {
        self.phases.size()
    }

    fn control(&mut self, t: f64, voxels: &mut Grid<Option<Voxel>>) {
        for (x, y, voxel) in voxels.occupied_mut() {
            if let Some(f) = self.value(x, y, t) {
                voxel.apply_force(f);
            }
        }
    }
}
