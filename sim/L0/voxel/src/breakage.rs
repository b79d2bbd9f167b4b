//! Stochastic component malfunctions.
//!
//! A [`Breakage`] is attached to a voxel to make it breakable. Once per
//! `act(t)` it accumulates three trigger counters (elapsed time, control
//! energy and area-ratio energy). For each configured trigger, checked in
//! the order [`Trigger::Control`], [`Trigger::Area`], [`Trigger::Time`], the
//! voxel breaks with probability
//!
//! ```text
//! p = 1 − tanh(threshold / counter)
//! ```
//!
//! The first trigger that fires wins. A break resets all counters and puts
//! one uniformly chosen component into one of its configured malfunctions.
//! When more than `restore_time` elapses without a new break, every
//! component returns to [`Malfunction::None`].

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_types::{Result, SimError};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sensor::Domain;

/// A part of a voxel that can malfunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Component {
    /// The actuation input.
    Actuator,
    /// The sensor readings.
    Sensors,
    /// The structural springs.
    Structure,
}

impl Component {
    /// All components.
    pub const ALL: [Self; 3] = [Self::Actuator, Self::Sensors, Self::Structure];

    /// Whether this component supports the given malfunction.
    #[must_use]
    pub fn supports(self, malfunction: Malfunction) -> bool {
        match self {
            Self::Actuator | Self::Sensors => true,
            Self::Structure => matches!(malfunction, Malfunction::None | Malfunction::Frozen),
        }
    }
}

/// State of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Malfunction {
    /// Working normally.
    #[default]
    None,
    /// Outputs zeros.
    Zero,
    /// Repeats its last output; rigid springs for [`Component::Structure`].
    Frozen,
    /// Outputs uniform random values.
    Random,
}

/// A counter that may cause a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Trigger {
    /// Control energy spent since the last break.
    Control,
    /// Area-ratio energy accumulated since the last break.
    Area,
    /// Time elapsed since the last break.
    Time,
}

/// Configuration of a breakable voxel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BreakageConfig {
    /// Malfunctions each component may enter when it breaks.
    pub malfunctions: BTreeMap<Component, Vec<Malfunction>>,
    /// Threshold of each active trigger.
    pub triggers: BTreeMap<Trigger, f64>,
    /// Time without breaks after which every component is restored.
    pub restore_time: f64,
    /// Seed of the voxel's random stream.
    pub seed: u64,
}

impl BreakageConfig {
    /// A configuration with no malfunctions, no triggers and no restore.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            malfunctions: BTreeMap::new(),
            triggers: BTreeMap::new(),
            restore_time: f64::INFINITY,
            seed,
        }
    }

    /// Allow a component to break into the given malfunctions.
    #[must_use]
    pub fn with_malfunctions(
        mut self,
        component: Component,
        malfunctions: impl IntoIterator<Item = Malfunction>,
    ) -> Self {
        self.malfunctions
            .insert(component, malfunctions.into_iter().collect());
        self
    }

    /// Activate a trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger, threshold: f64) -> Self {
        self.triggers.insert(trigger, threshold);
        self
    }

    /// Set the restore time.
    #[must_use]
    pub fn with_restore_time(mut self, restore_time: f64) -> Self {
        self.restore_time = restore_time;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or unsupported malfunction sets,
    /// non-positive thresholds, or a negative restore time.
    pub fn validate(&self) -> Result<()> {
        for (component, malfunctions) in &self.malfunctions {
            if malfunctions.is_empty() {
                return Err(SimError::invalid_config(format!(
                    "{component:?} has an empty malfunction set"
                )));
            }
            for malfunction in malfunctions {
                if *malfunction == Malfunction::None || !component.supports(*malfunction) {
                    return Err(SimError::invalid_config(format!(
                        "{component:?} cannot break into {malfunction:?}"
                    )));
                }
            }
        }
        for (trigger, threshold) in &self.triggers {
            if !(threshold.is_finite() && *threshold > 0.0) {
                return Err(SimError::invalid_config(format!(
                    "{trigger:?} threshold must be positive, got {threshold}"
                )));
            }
        }
        if self.restore_time.is_nan() || self.restore_time < 0.0 {
            return Err(SimError::invalid_config(format!(
                "restore time must be non-negative, got {}",
                self.restore_time
            )));
        }
        Ok(())
    }
}

/// Malfunction state machine of one voxel.
#[derive(Debug, Clone)]
pub struct Breakage {
    config: BreakageConfig,
    rng: ChaCha8Rng,
    state: BTreeMap<Component, Malfunction>,
    counters: BTreeMap<Trigger, f64>,
    last_t: f64,
    last_control_energy: f64,
    last_area_energy: f64,
    last_break_time: f64,
}

impl Breakage {
    /// Create a state machine with every component working.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: BreakageConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut breakage = Self {
            config,
            rng,
            state: BTreeMap::new(),
            counters: BTreeMap::new(),
            last_t: 0.0,
            last_control_energy: 0.0,
            last_area_energy: 0.0,
            last_break_time: 0.0,
        };
        breakage.reset();
        Ok(breakage)
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &BreakageConfig {
        &self.config
    }

    /// Restore all components, clear counters and reseed the random stream.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.state = Component::ALL
            .into_iter()
            .map(|c| (c, Malfunction::None))
            .collect();
        self.reset_counters();
        self.last_t = 0.0;
        self.last_control_energy = 0.0;
        self.last_area_energy = 0.0;
        self.last_break_time = 0.0;
    }

    fn reset_counters(&mut self) {
        self.counters = [Trigger::Control, Trigger::Area, Trigger::Time]
            .into_iter()
            .map(|t| (t, 0.0))
            .collect();
    }

    /// Current state of every component.
    #[must_use]
    pub fn state(&self) -> &BTreeMap<Component, Malfunction> {
        &self.state
    }

    /// Current state of one component.
    #[must_use]
    pub fn malfunction(&self, component: Component) -> Malfunction {
        self.state.get(&component).copied().unwrap_or_default()
    }

    /// Current value of a trigger counter.
    #[must_use]
    pub fn counter(&self, trigger: Trigger) -> f64 {
        self.counters.get(&trigger).copied().unwrap_or(0.0)
    }

    /// Whether any component is malfunctioning.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state.values().any(|m| *m != Malfunction::None)
    }

    /// Advance the state machine to time `t` given the voxel's cumulative
    /// energies.
    ///
    /// Returns `true` if the structure state changed.
    pub fn update(&mut self, t: f64, control_energy: f64, area_energy: f64) -> bool {
        *self.counters.entry(Trigger::Time).or_insert(0.0) += (t - self.last_t).max(0.0);
        *self.counters.entry(Trigger::Control).or_insert(0.0) +=
            control_energy - self.last_control_energy;
        *self.counters.entry(Trigger::Area).or_insert(0.0) += area_energy - self.last_area_energy;
        self.last_t = t;
        self.last_control_energy = control_energy;
        self.last_area_energy = area_energy;

        let mut structure_changed = false;
        if self.is_broken() && t - self.last_break_time > self.config.restore_time {
            structure_changed = self.malfunction(Component::Structure) != Malfunction::None;
            for state in self.state.values_mut() {
                *state = Malfunction::None;
            }
            debug!(t, "voxel restored");
        }

        let triggers: Vec<(Trigger, f64)> =
            self.config.triggers.iter().map(|(k, v)| (*k, *v)).collect();
        for (trigger, threshold) in triggers {
            let counter = self.counter(trigger);
            if counter <= 0.0 {
                continue;
            }
            let probability = 1.0 - (threshold / counter).tanh();
            if self.rng.gen::<f64>() < probability {
                structure_changed |= self.break_random(t, trigger);
                break;
            }
        }
        structure_changed
    }

    fn break_random(&mut self, t: f64, trigger: Trigger) -> bool {
        let candidates: Vec<Component> = self.config.malfunctions.keys().copied().collect();
        if candidates.is_empty() {
            self.reset_counters();
            self.last_break_time = t;
            return false;
        }
        let component = candidates[self.rng.gen_range(0..candidates.len())];
        let options = self
            .config
            .malfunctions
            .get(&component)
            .map_or(&[][..], Vec::as_slice);
        let Some(&malfunction) = options.get(self.rng.gen_range(0..options.len().max(1))) else {
            return false;
        };
        debug!(t, ?trigger, ?component, ?malfunction, "voxel broke");
        self.set(t, component, malfunction)
    }

    /// Put a component into a malfunction at time `t`, as if a trigger had
    /// fired.
    ///
    /// Returns `true` if the structure state changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the component does not support the malfunction.
    pub fn break_now(&mut self, t: f64, component: Component, malfunction: Malfunction) -> Result<bool> {
        if !component.supports(malfunction) {
            return Err(SimError::invalid_config(format!(
                "{component:?} cannot break into {malfunction:?}"
            )));
        }
        Ok(self.set(t, component, malfunction))
    }

    fn set(&mut self, t: f64, component: Component, malfunction: Malfunction) -> bool {
        self.reset_counters();
        self.last_break_time = t;
        let previous = self.state.insert(component, malfunction).unwrap_or_default();
        component == Component::Structure && previous != malfunction
    }

    /// Effective actuation value for a requested one.
    pub fn actuation(&mut self, requested: f64, last: f64) -> f64 {
        match self.malfunction(Component::Actuator) {
            Malfunction::None => requested,
            Malfunction::Zero => 0.0,
            Malfunction::Frozen => last,
            Malfunction::Random => self.rng.gen_range(-1.0..=1.0),
        }
    }

    /// Effective sensor readings given fresh ones, the previous readings and
    /// the channel domains.
    pub fn readings(&mut self, fresh: Vec<f64>, previous: &[f64], domains: &[Domain]) -> Vec<f64> {
        match self.malfunction(Component::Sensors) {
            Malfunction::None => fresh,
            Malfunction::Zero => vec![0.0; fresh.len()],
            Malfunction::Frozen if previous.len() == fresh.len() => previous.to_vec(),
            Malfunction::Frozen => fresh,
            Malfunction::Random => domains.iter().map(|d| d.sample(&mut self.rng)).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn always_breaking(seed: u64) -> BreakageConfig {
        BreakageConfig::new(seed)
            .with_malfunctions(Component::Actuator, [Malfunction::Zero, Malfunction::Random])
            .with_malfunctions(Component::Structure, [Malfunction::Frozen])
            .with_trigger(Trigger::Time, 1e-9)
    }

    #[test]
    fn test_structure_only_freezes() {
        let config = BreakageConfig::new(0).with_malfunctions(Component::Structure, [Malfunction::Zero]);
        assert!(config.validate().is_err());
        let config = BreakageConfig::new(0).with_malfunctions(Component::Sensors, []);
        assert!(config.validate().is_err());
        let config = BreakageConfig::new(0).with_trigger(Trigger::Area, 0.0);
        assert!(Breakage::new(config).is_err());
    }

    #[test]
    fn test_no_break_without_counters() {
        let mut breakage = Breakage::new(always_breaking(1)).unwrap();
        // No time has elapsed: the counter is zero and nothing can fire
        breakage.update(0.0, 0.0, 0.0);
        assert!(!breakage.is_broken());
    }

    #[test]
    fn test_tiny_threshold_breaks() {
        let mut breakage = Breakage::new(always_breaking(1)).unwrap();
        breakage.update(0.1, 0.0, 0.0);
        assert!(breakage.is_broken());
        // Counters reset on break
        assert_eq!(breakage.counter(Trigger::Time), 0.0);
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = |seed| {
            let mut breakage = Breakage::new(
                BreakageConfig::new(seed)
                    .with_malfunctions(Component::Actuator, [Malfunction::Zero, Malfunction::Frozen])
                    .with_malfunctions(Component::Sensors, [Malfunction::Random])
                    .with_trigger(Trigger::Time, 0.5)
                    .with_restore_time(0.3),
            )
            .unwrap();
            (1..200)
                .map(|i| {
                    breakage.update(f64::from(i) * 0.05, 0.0, 0.0);
                    breakage.state().clone()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_restore_after_quiet_period() {
        let mut breakage = Breakage::new(BreakageConfig::new(3).with_restore_time(1.0)).unwrap();
        let changed = breakage
            .break_now(0.0, Component::Structure, Malfunction::Frozen)
            .unwrap();
        assert!(changed);
        breakage.update(0.5, 0.0, 0.0);
        assert!(breakage.is_broken());
        let changed = breakage.update(1.0 + 1e-6, 0.0, 0.0);
        assert!(changed);
        assert!(!breakage.is_broken());
    }

    #[test]
    fn test_reset_reseeds() {
        let mut breakage = Breakage::new(always_breaking(11)).unwrap();
        breakage.update(0.1, 0.0, 0.0);
        let first = breakage.state().clone();
        breakage.reset();
        assert!(!breakage.is_broken());
        breakage.update(0.1, 0.0, 0.0);
        assert_eq!(breakage.state(), &first);
    }

    #[test]
    fn test_actuator_malfunctions() {
        let mut breakage = Breakage::new(BreakageConfig::new(5)).unwrap();
        assert_eq!(breakage.actuation(0.7, 0.2), 0.7);
        breakage
            .break_now(0.0, Component::Actuator, Malfunction::Zero)
            .unwrap();
        assert_eq!(breakage.actuation(0.7, 0.2), 0.0);
        breakage
            .break_now(0.0, Component::Actuator, Malfunction::Frozen)
            .unwrap();
        assert_eq!(breakage.actuation(0.7, 0.2), 0.2);
        breakage
            .break_now(0.0, Component::Actuator, Malfunction::Random)
            .unwrap();
        let f = breakage.actuation(0.7, 0.2);
        assert!((-1.0..=1.0).contains(&f));
    }

    #[test]
    fn test_sensor_malfunctions() {
        let domains = [Domain::new(0.0, 1.0), Domain::new(-5.0, 5.0)];
        let mut breakage = Breakage::new(BreakageConfig::new(5)).unwrap();
        breakage
            .break_now(0.0, Component::Sensors, Malfunction::Frozen)
            .unwrap();
        assert_eq!(breakage.readings(vec![0.3, 1.0], &[0.1, 2.0], &domains), vec![0.1, 2.0]);
        breakage
            .break_now(0.0, Component::Sensors, Malfunction::Zero)
            .unwrap();
        assert_eq!(breakage.readings(vec![0.3, 1.0], &[], &domains), vec![0.0, 0.0]);
        breakage
            .break_now(0.0, Component::Sensors, Malfunction::Random)
            .unwrap();
        let random = breakage.readings(vec![0.3, 1.0], &[], &domains);
        assert!(domains.iter().zip(&random).all(|(d, v)| d.contains(*v)));
    }
}
