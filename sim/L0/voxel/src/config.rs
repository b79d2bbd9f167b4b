//! Voxel configuration.
//!
//! A voxel is a square of side `L` with a square mass of side `L·ratio` in
//! each corner. Structural springs between the masses are grouped into
//! scaffoldings; each group derives its [`SpringRange`] from the side lengths
//! the voxel may reach when fully contracted or expanded:
//!
//! ```text
//! min side = L·√(1 − δ)      rest side = L      max side = L·√(1 + δ)
//! ```
//!
//! so that a fully actuated voxel has an area ratio of `1 − δ` or `1 + δ`.

use sim_types::{Result, SimError, SpringRange};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How actuation values are turned into motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActuationMode {
    /// Radial forces from each corner mass toward the voxel centroid.
    Force,
    /// Spring target lengths interpolated within each spring's range.
    #[default]
    Distance,
}

/// A group of structural springs between corner masses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpringScaffolding {
    /// Facing corners of masses along the same side.
    SideInternal,
    /// Outer corners of masses along the same side.
    SideExternal,
    /// Crossed corners of masses along the same side.
    SideCross,
    /// Inner corners of diagonally opposite masses.
    CentralCross,
}

impl SpringScaffolding {
    /// All scaffoldings, in construction order.
    pub const ALL: [Self; 4] = [
        Self::SideInternal,
        Self::SideExternal,
        Self::SideCross,
        Self::CentralCross,
    ];

    /// Anchor distance of this group for a voxel of side `side` whose masses
    /// have side `mass_side`.
    #[must_use]
    pub fn rest_length(self, side: f64, mass_side: f64) -> f64 {
        let inner = side - 2.0 * mass_side;
        match self {
            Self::SideInternal => inner,
            Self::SideExternal => side,
            Self::SideCross => inner.hypot(mass_side),
            Self::CentralCross => std::f64::consts::SQRT_2 * inner,
        }
    }
}

/// Configuration of a voxel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelConfig {
    /// Side length `L` of the voxel at rest.
    pub side_length: f64,
    /// Ratio between the side of a corner mass and `L`.
    pub mass_side_length_ratio: f64,
    /// Total mass, split evenly across the four corners.
    pub mass: f64,
    /// Natural frequency of the structural springs (Hz).
    pub spring_frequency: f64,
    /// Damping ratio of the structural springs.
    pub spring_damping: f64,
    /// Largest relative area change reachable by actuation.
    pub area_ratio_max_delta: f64,
    /// Spring groups to build.
    pub scaffoldings: Vec<SpringScaffolding>,
    /// Force magnitude per corner for `f = ±1` in [`ActuationMode::Force`].
    pub max_force: f64,
    /// Actuation strategy.
    pub actuation: ActuationMode,
    /// Linear damping of the corner masses.
    pub linear_damping: f64,
    /// Angular damping of the corner masses.
    pub angular_damping: f64,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            side_length: 3.0,
            mass_side_length_ratio: 0.30,
            mass: 1.0,
            spring_frequency: 8.0,
            spring_damping: 0.3,
            area_ratio_max_delta: 0.225,
            scaffoldings: SpringScaffolding::ALL.to_vec(),
            max_force: 100.0,
            actuation: ActuationMode::Distance,
            linear_damping: 0.1,
            angular_damping: 0.1,
        }
    }
}

impl VoxelConfig {
    /// Set the side length.
    #[must_use]
    pub fn with_side_length(mut self, side_length: f64) -> Self {
        self.side_length = side_length;
        self
    }

    /// Set the spring frequency and damping ratio.
    #[must_use]
    pub fn with_springs(mut self, frequency: f64, damping: f64) -> Self {
        self.spring_frequency = frequency;
        self.spring_damping = damping;
        self
    }

    /// Set the largest relative area change.
    #[must_use]
    pub fn with_area_ratio_max_delta(mut self, delta: f64) -> Self {
        self.area_ratio_max_delta = delta;
        self
    }

    /// Set which spring groups are built.
    #[must_use]
    pub fn with_scaffoldings(mut self, scaffoldings: impl IntoIterator<Item = SpringScaffolding>) -> Self {
        let mut scaffoldings: Vec<_> = scaffoldings.into_iter().collect();
        scaffoldings.sort_unstable();
        scaffoldings.dedup();
        self.scaffoldings = scaffoldings;
        self
    }

    /// Set the actuation strategy.
    #[must_use]
    pub fn with_actuation(mut self, actuation: ActuationMode) -> Self {
        self.actuation = actuation;
        self
    }

    /// Set the force magnitude used in [`ActuationMode::Force`].
    #[must_use]
    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }

    /// Side length of a corner mass.
    #[must_use]
    pub fn mass_side_length(&self) -> f64 {
        self.side_length * self.mass_side_length_ratio
    }

    /// Rest area `L²`.
    #[must_use]
    pub fn rest_area(&self) -> f64 {
        self.side_length * self.side_length
    }

    /// Side length of the fully contracted voxel.
    #[must_use]
    pub fn min_side_length(&self) -> f64 {
        self.side_length * (1.0 - self.area_ratio_max_delta).sqrt()
    }

    /// Side length of the fully expanded voxel.
    #[must_use]
    pub fn max_side_length(&self) -> f64 {
        self.side_length * (1.0 + self.area_ratio_max_delta).sqrt()
    }

    /// Spring range of one scaffolding group.
    ///
    /// # Errors
    ///
    /// Returns an error if the group's bounds are not ordered or negative.
    pub fn spring_range(&self, scaffolding: SpringScaffolding) -> Result<SpringRange> {
        let m = self.mass_side_length();
        SpringRange::new(
            scaffolding.rest_length(self.min_side_length(), m),
            scaffolding.rest_length(self.side_length, m),
            scaffolding.rest_length(self.max_side_length(), m),
        )
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range or a spring group
    /// would get an invalid [`SpringRange`].
    pub fn validate(&self) -> Result<()> {
        if !(self.side_length.is_finite() && self.side_length > 0.0) {
            return Err(SimError::invalid_config(format!(
                "side length must be positive, got {}",
                self.side_length
            )));
        }
        if !(self.mass_side_length_ratio > 0.0 && self.mass_side_length_ratio < 0.5) {
            return Err(SimError::invalid_config(format!(
                "mass side length ratio must be in (0, 0.5), got {}",
                self.mass_side_length_ratio
            )));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::invalid_config(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        if !(self.spring_frequency >= 0.0 && self.spring_damping >= 0.0) {
            return Err(SimError::invalid_config("spring frequency and damping must be non-negative"));
        }
        if !(self.area_ratio_max_delta >= 0.0 && self.area_ratio_max_delta < 1.0) {
            return Err(SimError::invalid_config(format!(
                "area ratio max delta must be in [0, 1), got {}",
                self.area_ratio_max_delta
            )));
        }
        if !(self.max_force.is_finite() && self.max_force >= 0.0) {
            return Err(SimError::invalid_config("max force must be non-negative"));
        }
        if self.linear_damping < 0.0 || self.angular_damping < 0.0 {
            return Err(SimError::invalid_config("damping must be non-negative"));
        }
        for scaffolding in &self.scaffoldings {
            self.spring_range(*scaffolding)?;
        }
        Ok(())
    }
}
