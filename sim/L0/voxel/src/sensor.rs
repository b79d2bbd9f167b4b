//! Voxel sensors.
//!
//! A sensor reads one or more channels from the voxel it is attached to.
//! Each channel declares the [`Domain`] its values are expected to fall in;
//! domains are also used to draw random readings when the voxel's sensors
//! malfunction.
//!
//! | Sensor | Channels | Domain |
//! |--------|----------|--------|
//! | [`AreaRatioSensor`] | area ratio | `[1 − δ, 1 + δ]` |
//! | [`AngleSensor`] | orientation | `[−π, π]` |
//! | [`VelocitySensor`] | x and y velocity | `[−v, v]` |
//! | [`TouchSensor`] | ground contact | `[0, 1]` |
//! | [`ControlPowerSensor`] | control power | `[0, p]` |

use std::fmt;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Voxel;

/// Expected range of one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Domain {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Domain {
    /// Create a domain.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Domain `[-bound, bound]`.
    #[must_use]
    pub fn symmetric(bound: f64) -> Self {
        Self::new(-bound.abs(), bound.abs())
    }

    /// Whether `value` lies in the domain.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Draw a uniform value from the domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// A per-voxel sensor.
pub trait Sensor: fmt::Debug + Send {
    /// Domains of the channels, in output order.
    fn domains(&self) -> Vec<Domain>;

    /// Read the channels at time `t`.
    fn sense(&mut self, voxel: &Voxel, t: f64) -> Vec<f64>;

    /// Clear any internal state.
    fn reset(&mut self) {}
}

/// Current area over rest area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaRatioSensor {
    max_delta: f64,
}

impl AreaRatioSensor {
    /// Create a sensor whose domain is `1 ± max_delta`.
    #[must_use]
    pub fn new(max_delta: f64) -> Self {
        Self {
            max_delta: max_delta.abs(),
        }
    }
}

impl Default for AreaRatioSensor {
    fn default() -> Self {
        Self::new(0.225)
    }
}

impl Sensor for AreaRatioSensor {
    fn domains(&self) -> Vec<Domain> {
        vec![Domain::new(1.0 - self.max_delta, 1.0 + self.max_delta)]
    }

    fn sense(&mut self, voxel: &Voxel, _t: f64) -> Vec<f64> {
        vec![voxel.area_ratio()]
    }
}

/// Orientation of the voxel's vertical sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleSensor;

impl Sensor for AngleSensor {
    fn domains(&self) -> Vec<Domain> {
        vec![Domain::symmetric(std::f64::consts::PI)]
    }

    fn sense(&mut self, voxel: &Voxel, _t: f64) -> Vec<f64> {
        vec![voxel.angle()]
    }
}

/// Linear velocity of the voxel's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySensor {
    max_speed: f64,
}

impl VelocitySensor {
    /// Create a sensor with domain `[-max_speed, max_speed]` per axis.
    #[must_use]
    pub fn new(max_speed: f64) -> Self {
        Self { max_speed }
    }
}

impl Default for VelocitySensor {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl Sensor for VelocitySensor {
    fn domains(&self) -> Vec<Domain> {
        vec![Domain::symmetric(self.max_speed); 2]
    }

    fn sense(&mut self, voxel: &Voxel, _t: f64) -> Vec<f64> {
        let v = voxel.linear_velocity();
        vec![v.x, v.y]
    }
}

/// `1` while any corner mass touches the ground, `0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchSensor;

impl Sensor for TouchSensor {
    fn domains(&self) -> Vec<Domain> {
        vec![Domain::new(0.0, 1.0)]
    }

    fn sense(&mut self, voxel: &Voxel, _t: f64) -> Vec<f64> {
        vec![if voxel.is_touching_ground() { 1.0 } else { 0.0 }]
    }
}

/// Control energy spent per unit of time since the previous reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPowerSensor {
    max_power: f64,
    last_t: f64,
    last_energy: f64,
}

impl ControlPowerSensor {
    /// Create a sensor with domain `[0, max_power]`.
    #[must_use]
    pub fn new(max_power: f64) -> Self {
        Self {
            max_power,
            last_t: 0.0,
            last_energy: 0.0,
        }
    }
}

impl Default for ControlPowerSensor {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl Sensor for ControlPowerSensor {
    fn domains(&self) -> Vec<Domain> {
        vec![Domain::new(0.0, self.max_power)]
    }

    fn sense(&mut self, voxel: &Voxel, t: f64) -> Vec<f64> {
        let dt = t - self.last_t;
        let energy = voxel.control_energy();
        let power = if dt > 0.0 {
            (energy - self.last_energy) / dt
        } else {
            0.0
        };
        self.last_t = t;
        self.last_energy = energy;
        vec![power]
    }

    fn reset(&mut self) {
        self.last_t = 0.0;
        self.last_energy = 0.0;
    }
}
