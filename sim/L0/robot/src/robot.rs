//! Robot assembly and per-step update.
//!
//! A robot is a rectangular grid of optional voxels. Cell `(x, y)` sits at
//! `(x·L, y·L)`; every populated cell is welded to its west and south
//! populated neighbours at the two pairs of corner masses that share an
//! edge:
//!
//! ```text
//!   west        this             this
//!  ┌────NE┐┌NW────┐            ┌SW────SE┐
//!  │      ││      │            └────────┘
//!  │      ││      │            ┌────────┐
//!  └────SE┘└SW────┘            └NW────NE┘
//!                               south
//! ```
//!
//! All compliance comes from the voxels' own springs; welds are rigid.

use nalgebra::{Point2, Vector2};
use sim_core::{JointDesc, PhysicsWorld};
use sim_types::{BoundingBox, Grid, SimError};
use sim_voxel::{Corner, Voxel, VoxelPoly};
use tracing::debug;

use crate::controller::Controller;
use crate::error::{Result, RobotError};

/// A weld between two corner masses of neighbouring voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weld {
    /// Cell of the first voxel.
    pub cell_a: (usize, usize),
    /// Corner of the first voxel.
    pub corner_a: Corner,
    /// Cell of the second voxel.
    pub cell_b: (usize, usize),
    /// Corner of the second voxel.
    pub corner_b: Corner,
    /// Direction from the first mass toward the shared edge.
    pub direction: (f64, f64),
}

/// A soft robot: a grid of voxels driven by a controller.
#[derive(Debug)]
pub struct Robot {
    voxels: Grid<Option<Voxel>>,
    controller: Box<dyn Controller>,
    welds: Vec<Weld>,
}

impl Robot {
    /// Assemble a robot and reset it.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::GridMismatch`] if the controller expects a
    /// different grid, and [`RobotError::MixedSideLengths`] if voxels differ
    /// in size.
    pub fn new(voxels: Grid<Option<Voxel>>, controller: Box<dyn Controller>) -> Result<Self> {
        if controller.grid_size() != voxels.size() {
            return Err(RobotError::GridMismatch {
                expected: controller.grid_size(),
                actual: voxels.size(),
            });
        }
        check_side_lengths(&voxels)?;

        let welds = plan_welds(&voxels);
        let mut robot = Self {
            voxels,
            controller,
            welds,
        };
        robot.reset();
        Ok(robot)
    }

    /// The voxel grid.
    #[must_use]
    pub fn voxels(&self) -> &Grid<Option<Voxel>> {
        &self.voxels
    }

    /// Mutable access to the voxel grid.
    pub fn voxels_mut(&mut self) -> &mut Grid<Option<Voxel>> {
        &mut self.voxels
    }

    /// The controller.
    #[must_use]
    pub fn controller(&self) -> &dyn Controller {
        self.controller.as_ref()
    }

    /// Welds joining neighbouring voxels.
    #[must_use]
    pub fn welds(&self) -> &[Weld] {
        &self.welds
    }

    /// Number of populated cells.
    #[must_use]
    pub fn num_voxels(&self) -> usize {
        self.voxels.count_occupied()
    }

    /// Reset every voxel to rest at its grid position and reset the
    /// controller. The robot must be registered with a world again.
    pub fn reset(&mut self) {
        for (x, y, voxel) in self.voxels.occupied_mut() {
            voxel.reset();
            let side = voxel.side_length();
            voxel.translate(&Vector2::new(x as f64 * side, y as f64 * side));
        }
        self.controller.reset();
    }

    /// Add every voxel and the welds between them to a world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a joint.
    pub fn register(&mut self, world: &mut dyn PhysicsWorld) -> Result<()> {
        for (_, _, voxel) in self.voxels.occupied_mut() {
            voxel.register(world)?;
        }
        for weld in &self.welds {
            let body = |cell: (usize, usize), corner: Corner| {
                self.voxels
                    .get(cell.0, cell.1)
                    .and_then(Option::as_ref)
                    .and_then(|v| v.corner_body(corner))
                    .ok_or_else(|| SimError::invalid_config(format!("no voxel at {cell:?}")))
            };
            let a = body(weld.cell_a, weld.corner_a)?;
            let b = body(weld.cell_b, weld.corner_b)?;
            let half = self
                .voxels
                .get(weld.cell_a.0, weld.cell_a.1)
                .and_then(Option::as_ref)
                .map_or(0.0, |v| v.config().mass_side_length() / 2.0);
            let d = Vector2::new(weld.direction.0, weld.direction.1) * half;
            world.add_joint(JointDesc::weld(a, b, d, -d))?;
        }
        debug!(
            voxels = self.num_voxels(),
            welds = self.welds.len(),
            "robot registered"
        );
        Ok(())
    }

    /// Refresh every voxel from the world.
    ///
    /// # Errors
    ///
    /// Returns an error if a voxel's bodies are unknown to the world.
    pub fn sync_from_world(&mut self, world: &dyn PhysicsWorld) -> Result<()> {
        for (_, _, voxel) in self.voxels.occupied_mut() {
            voxel.sync_from_world(world)?;
        }
        Ok(())
    }

    /// Push every voxel's pending actuation into the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a handle.
    pub fn flush_to_world(&mut self, world: &mut dyn PhysicsWorld) -> Result<()> {
        for (_, _, voxel) in self.voxels.occupied_mut() {
            voxel.flush_to_world(world)?;
        }
        Ok(())
    }

    /// Update voxels, then let the controller command them.
    pub fn act(&mut self, t: f64) {
        for (_, _, voxel) in self.voxels.occupied_mut() {
            voxel.act(t);
        }
        self.controller.control(t, &mut self.voxels);
    }

    /// Union of the voxels' bounding boxes.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::EmptyBody`] if no cell is populated.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        self.voxels
            .occupied()
            .map(|(_, _, v)| v.bounding_box())
            .reduce(|a, b| a.union(&b))
            .ok_or(RobotError::EmptyBody)
    }

    /// Mean of the voxel centers.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::EmptyBody`] if no cell is populated.
    pub fn center(&self) -> Result<Point2<f64>> {
        let n = self.num_voxels();
        if n == 0 {
            return Err(RobotError::EmptyBody);
        }
        let sum = self
            .voxels
            .occupied()
            .fold(Vector2::zeros(), |acc, (_, _, v)| acc + v.center().coords);
        Ok(Point2::from(sum / n as f64))
    }

    /// Move every voxel's cached geometry; call before registering.
    pub fn translate(&mut self, offset: &Vector2<f64>) {
        for (_, _, voxel) in self.voxels.occupied_mut() {
            voxel.translate(offset);
        }
    }

    /// Snapshot of every voxel.
    #[must_use]
    pub fn polys(&self) -> Grid<Option<VoxelPoly>> {
        self.voxels.map(|_, _, v| v.as_ref().map(Voxel::poly))
    }
}

/// All voxels must share the side length of the first one.
fn check_side_lengths(voxels: &Grid<Option<Voxel>>) -> Result<()> {
    let sides: Vec<(usize, usize, f64)> = voxels
        .occupied()
        .map(|(x, y, v)| (x, y, v.side_length()))
        .collect();
    let Some(&(_, _, expected)) = sides.first() else {
        return Ok(());
    };
    for &(x, y, side) in &sides[1..] {
        if (side - expected).abs() > 1e-9 * expected {
            return Err(RobotError::MixedSideLengths { x, y, side, expected });
        }
    }
    Ok(())
}

fn plan_welds(voxels: &Grid<Option<Voxel>>) -> Vec<Weld> {
    let occupied = |x: usize, y: usize| matches!(voxels.get(x, y), Some(Some(_)));
    let mut welds = Vec::new();
    for (x, y, _) in voxels.occupied() {
        if x > 0 && occupied(x - 1, y) {
            for (this, west) in [
                (Corner::SouthWest, Corner::SouthEast),
                (Corner::NorthWest, Corner::NorthEast),
            ] {
                welds.push(Weld {
                    cell_a: (x, y),
                    corner_a: this,
                    cell_b: (x - 1, y),
                    corner_b: west,
                    direction: (-1.0, 0.0),
                });
            }
        }
        if y > 0 && occupied(x, y - 1) {
            for (this, south) in [
                (Corner::SouthWest, Corner::NorthWest),
                (Corner::SouthEast, Corner::NorthEast),
            ] {
                welds.push(Weld {
                    cell_a: (x, y),
                    corner_a: this,
                    cell_b: (x, y - 1),
                    corner_b: south,
                    direction: (0.0, -1.0),
                });
            }
        }
    }
    welds
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controller::{PhaseSin, TimeFunctions};
    use crate::shape::build_body;
    use approx::assert_relative_eq;
    use sim_core::World;
    use sim_types::WorldSettings;
    use sim_voxel::VoxelConfig;

    fn robot(mask: &str) -> Robot {
        let shape = Grid::from_mask(mask).unwrap();
        let (w, h) = shape.size();
        let body = build_body(&shape, |_, _| Voxel::new(VoxelConfig::default())).unwrap();
        Robot::new(body, Box::new(TimeFunctions::zero(w, h))).unwrap()
    }

    #[test]
    fn test_grid_positions() {
        let robot = robot("11|11");
        let bb = robot.bounding_box().unwrap();
        assert_relative_eq!(bb.min.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bb.max.x, 6.0, epsilon = 1e-12);
        assert_relative_eq!(bb.max.y, 6.0, epsilon = 1e-12);
        let center = robot.center().unwrap();
        assert_relative_eq!(center.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weld_plan() {
        // Two horizontal neighbours share one edge
        assert_eq!(robot("11").welds().len(), 2);
        // An L shape: (0,0)-(1,0) and (0,0)-(0,1)
        assert_eq!(robot("10|11").welds().len(), 4);
        assert_eq!(robot("11|11").welds().len(), 8);
        // Diagonal neighbours are not welded
        assert_eq!(robot("10|01").welds().len(), 0);
    }

    #[test]
    fn test_empty_body() {
        let body: Grid<Option<Voxel>> = Grid::from_fn(2, 1, |_, _| None);
        let robot = Robot::new(body, Box::new(TimeFunctions::zero(2, 1))).unwrap();
        assert_eq!(robot.bounding_box(), Err(RobotError::EmptyBody));
        assert_eq!(robot.center(), Err(RobotError::EmptyBody));
    }

    #[test]
    fn test_controller_grid_mismatch() {
        let shape = Grid::rectangle(2, 1);
        let body = build_body(&shape, |_, _| Voxel::new(VoxelConfig::default())).unwrap();
        let err = Robot::new(body, Box::new(TimeFunctions::zero(3, 1))).unwrap_err();
        assert_eq!(
            err,
            RobotError::GridMismatch {
                expected: (3, 1),
                actual: (2, 1)
            }
        );
    }

    #[test]
    fn test_mixed_sides_rejected() {
        let shape = Grid::rectangle(2, 1);
        let body = build_body(&shape, |x, _| {
            Voxel::new(VoxelConfig::default().with_side_length(if x == 0 { 3.0 } else { 2.0 }))
        })
        .unwrap();
        let err = Robot::new(body, Box::new(TimeFunctions::zero(2, 1))).unwrap_err();
        assert!(matches!(err, RobotError::MixedSideLengths { x: 1, .. }));
    }

    #[test]
    fn test_uniform_sides_accepted() {
        let shape = Grid::rectangle(3, 2);
        let body = build_body(&shape, |_, _| {
            Voxel::new(VoxelConfig::default().with_side_length(2.5))
        })
        .unwrap();
        let robot = Robot::new(body, Box::new(TimeFunctions::zero(3, 2))).unwrap();
        assert_eq!(robot.num_voxels(), 6);
        assert!(robot.voxels().occupied().all(|(_, _, v)| v.side_length() == 2.5));
        assert!(!robot.welds().is_empty());
    }

    #[test]
    fn test_welds_hold_voxels_together() {
        let mut robot = robot("11");
        let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
        robot.register(&mut world).unwrap();
        for _ in 0..60 {
            robot.flush_to_world(&mut world).unwrap();
            world.step().unwrap();
            robot.sync_from_world(&world).unwrap();
            robot.act(world.time());
        }
        let bb = robot.bounding_box().unwrap();
        assert_relative_eq!(bb.width(), 6.0, epsilon = 0.05);
        assert_relative_eq!(bb.height(), 3.0, epsilon = 0.05);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let shape = Grid::rectangle(2, 1);
        let body = build_body(&shape, |_, _| Voxel::new(VoxelConfig::default())).unwrap();
        let controller = PhaseSin::from_fn(2, 1, 1.0, 1.0, |x, _| x as f64);
        let mut robot = Robot::new(body, Box::new(controller)).unwrap();
        robot.translate(&Vector2::new(5.0, 5.0));
        robot.act(0.3);
        robot.reset();
        let first = robot.polys();
        robot.reset();
        assert_eq!(robot.polys(), first);
        assert_relative_eq!(robot.bounding_box().unwrap().min.x, 0.0, epsilon = 1e-12);
    }
}
