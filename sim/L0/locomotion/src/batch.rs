//! Batched evaluation: many independent `(robot, task)` runs.
//!
//! Each run owns its robot and builds its own world, so runs share nothing
//! mutable. They are spread across CPU cores via rayon when the `parallel`
//! feature is enabled and evaluated in order otherwise. A failing run does
//! not affect the others.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sim_locomotion::{BatchEvaluation, Locomotion, LocomotionConfig};
//! use sim_robot::{build_body, Robot, TimeFunctions};
//! use sim_types::Grid;
//! use sim_voxel::{Voxel, VoxelConfig};
//!
//! let task = Arc::new(Locomotion::flat(LocomotionConfig::default().with_final_t(0.1)).unwrap());
//! let mut batch = BatchEvaluation::new();
//! for amplitude in [0.0, 0.5] {
//!     let body = build_body(&Grid::rectangle(2, 1), |_, _| Voxel::new(VoxelConfig::default())).unwrap();
//!     let controller = TimeFunctions::uniform(2, 1, move |t| amplitude * t.sin());
//!     batch.push(Robot::new(body, Box::new(controller)).unwrap(), Arc::clone(&task));
//! }
//! let outcomes = batch.run_all();
//! assert_eq!(outcomes.len(), 2);
//! assert!(outcomes.iter().all(Result::is_ok));
//! ```

use std::sync::Arc;

use sim_robot::Robot;
use tracing::warn;

use crate::error::Result;
use crate::locomotion::Locomotion;
use crate::outcome::Outcome;

/// A set of independent locomotion runs.
#[derive(Debug, Default)]
pub struct BatchEvaluation {
    runs: Vec<(Robot, Arc<Locomotion>)>,
}

impl BatchEvaluation {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate each robot on the same task.
    #[must_use]
    pub fn shared(task: Locomotion, robots: impl IntoIterator<Item = Robot>) -> Self {
        let task = Arc::new(task);
        Self {
            runs: robots.into_iter().map(|r| (r, Arc::clone(&task))).collect(),
        }
    }

    /// Add a run.
    pub fn push(&mut self, robot: Robot, task: Arc<Locomotion>) {
        self.runs.push((robot, task));
    }

    /// Number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the batch has no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Robot of run `i`, in its state after the last evaluation.
    #[must_use]
    pub fn robot(&self, i: usize) -> Option<&Robot> {
        self.runs.get(i).map(|(r, _)| r)
    }

    /// Evaluate every run; results are in insertion order.
    ///
    /// Output does not depend on thread count or scheduling: each run is a
    /// pure function of its robot and task.
    pub fn run_all(&mut self) -> Vec<Result<Outcome>> {
        #[cfg(feature = "parallel")]
        let results: Vec<Result<Outcome>> = {
            use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
            self.runs
                .par_iter_mut()
                .enumerate()
                .map(|(i, (robot, task))| evaluate(i, robot, task))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<Outcome>> = self
            .runs
            .iter_mut()
            .enumerate()
            .map(|(i, (robot, task))| evaluate(i, robot, task))
            .collect();

        results
    }
}

fn evaluate(i: usize, robot: &mut Robot, task: &Locomotion) -> Result<Outcome> {
    let result = task.apply(robot, None);
    if let Err(err) = &result {
        warn!(run = i, error = %err, "locomotion run failed");
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locomotion::LocomotionConfig;
    use sim_robot::{build_body, PhaseSin};
    use sim_types::Grid;
    use sim_voxel::{Voxel, VoxelConfig};

    fn worm(phase: f64) -> Robot {
        let body = build_body(&Grid::rectangle(3, 1), |_, _| Voxel::new(VoxelConfig::default())).unwrap();
        let controller = PhaseSin::from_fn(3, 1, 1.0, 1.0, move |x, _| x as f64 * phase);
        Robot::new(body, Box::new(controller)).unwrap()
    }

    fn task() -> Locomotion {
        Locomotion::flat(LocomotionConfig::default().with_final_t(0.5)).unwrap()
    }

    #[test]
    fn test_matches_individual_runs() {
        let phases = [0.0, 0.5, 1.0];
        let mut batch = BatchEvaluation::shared(task(), phases.iter().map(|p| worm(*p)));
        assert_eq!(batch.len(), 3);
        let outcomes = batch.run_all();
        for (phase, outcome) in phases.iter().zip(outcomes) {
            let expected = task().apply(&mut worm(*phase), None).unwrap();
            let outcome = outcome.unwrap();
            assert_eq!(outcome.len(), expected.len());
            assert_eq!(outcome.distance(), expected.distance());
        }
    }

    #[test]
    fn test_empty_batch() {
        let mut batch = BatchEvaluation::new();
        assert!(batch.is_empty());
        assert!(batch.run_all().is_empty());
        assert!(batch.robot(0).is_none());
    }
}
