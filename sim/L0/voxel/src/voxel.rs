//! The deformable voxel.
//!
//! ```text
//!   NW ┌──┐─────────┌──┐ NE
//!      └──┘         └──┘
//!       │  ╲       ╱  │
//!       │    ╲   ╱    │       corner masses of side m = L·ratio,
//!       │     ╳       │       joined by spring scaffoldings and
//!       │    ╱   ╲    │       rope limiters between neighbours
//!      ┌──┐         ┌──┐
//!   SW └──┘─────────└──┘ SE
//! ```
//!
//! The outer polygon is also held by rigid two-sided limits on its four
//! edges and two diagonals, which keep the area ratio inside
//! `1 ± area_ratio_max_delta` whatever the springs do.
//!
//! A voxel keeps a cached copy of its corner body states. Before it is
//! registered with a [`PhysicsWorld`] the cache is the voxel's geometry and
//! can be translated freely. Once registered, the owner calls
//! [`sync_from_world`](Voxel::sync_from_world) after each step and
//! [`flush_to_world`](Voxel::flush_to_world) after control, so that sensing
//! and actuation never need the world.

use std::collections::BTreeMap;

use nalgebra::{Point2, Vector2};
use sim_core::{BodyDesc, BodyId, BodyState, JointDesc, JointId, PhysicsWorld};
use sim_types::{area, BoundingBox, Result, SimError, SpringRange};

use crate::breakage::{Breakage, BreakageConfig, Component, Malfunction};
use crate::config::{ActuationMode, SpringScaffolding, VoxelConfig};
use crate::poly::VoxelPoly;
use crate::sensor::{Domain, Sensor};

/// A corner of a voxel, counter-clockwise from south-west.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Corner {
    /// Lower left.
    SouthWest,
    /// Lower right.
    SouthEast,
    /// Upper right.
    NorthEast,
    /// Upper left.
    NorthWest,
}

impl Corner {
    /// All corners, counter-clockwise from south-west.
    pub const ALL: [Self; 4] = [Self::SouthWest, Self::SouthEast, Self::NorthEast, Self::NorthWest];

    /// Position in [`Corner::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit signs `(sx, sy)` pointing from the voxel center to this corner.
    #[must_use]
    pub const fn signs(self) -> (f64, f64) {
        match self {
            Self::SouthWest => (-1.0, -1.0),
            Self::SouthEast => (1.0, -1.0),
            Self::NorthEast => (1.0, 1.0),
            Self::NorthWest => (-1.0, 1.0),
        }
    }
}

/// Share of the actuation range kept clear between the area limiters and
/// `1 ± area_ratio_max_delta`.
const LIMIT_MARGIN: f64 = 0.05;

/// Sides as (from, to) corner pairs, with the in-plane direction from `from`
/// to `to` and the outward normal.
const SIDES: [(Corner, Corner, (f64, f64), (f64, f64)); 4] = [
    (Corner::SouthWest, Corner::SouthEast, (1.0, 0.0), (0.0, -1.0)),
    (Corner::SouthEast, Corner::NorthEast, (0.0, 1.0), (1.0, 0.0)),
    (Corner::NorthWest, Corner::NorthEast, (1.0, 0.0), (0.0, 1.0)),
    (Corner::SouthWest, Corner::NorthWest, (0.0, 1.0), (-1.0, 0.0)),
];

#[derive(Debug, Clone)]
struct Spring {
    a: Corner,
    b: Corner,
    anchor_a: Vector2<f64>,
    anchor_b: Vector2<f64>,
    range: SpringRange,
}

#[derive(Debug, Clone)]
struct Handles {
    bodies: [BodyId; 4],
    springs: Vec<JointId>,
}

/// A soft square made of four corner masses.
#[derive(Debug)]
pub struct Voxel {
    config: VoxelConfig,
    springs: Vec<Spring>,
    corners: [BodyState; 4],
    handles: Option<Handles>,
    sensors: Vec<Box<dyn Sensor>>,
    readings: Vec<f64>,
    breakage: Option<Breakage>,
    last_applied_force: f64,
    pending_force: Option<f64>,
    control_energy: f64,
    area_ratio_energy: f64,
    structure_dirty: bool,
}

impl Voxel {
    /// Create a voxel at rest with its lower-left corner at the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, including spring
    /// ranges that are not ordered.
    pub fn new(config: VoxelConfig) -> Result<Self> {
        config.validate()?;
        let springs = build_springs(&config)?;
        let corners = rest_corners(&config);
        Ok(Self {
            config,
            springs,
            corners,
            handles: None,
            sensors: Vec::new(),
            readings: Vec::new(),
            breakage: None,
            last_applied_force: 0.0,
            pending_force: None,
            control_energy: 0.0,
            area_ratio_energy: 0.0,
            structure_dirty: false,
        })
    }

    /// Attach sensors; readings are concatenated in order.
    #[must_use]
    pub fn with_sensors(mut self, sensors: Vec<Box<dyn Sensor>>) -> Self {
        self.sensors = sensors;
        self
    }

    /// Make the voxel breakable.
    ///
    /// # Errors
    ///
    /// Returns an error if the breakage configuration is invalid.
    pub fn with_breakage(mut self, config: BreakageConfig) -> Result<Self> {
        self.breakage = Some(Breakage::new(config)?);
        Ok(self)
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &VoxelConfig {
        &self.config
    }

    /// Side length at rest.
    #[must_use]
    pub fn side_length(&self) -> f64 {
        self.config.side_length
    }

    /// Spring ranges of the structural springs, in joint order.
    pub fn spring_ranges(&self) -> impl Iterator<Item = &SpringRange> {
        self.springs.iter().map(|s| &s.range)
    }

    /// Whether the voxel has bodies in a world.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.handles.is_some()
    }

    /// Body of a corner mass, once registered.
    #[must_use]
    pub fn corner_body(&self, corner: Corner) -> Option<BodyId> {
        self.handles.as_ref().map(|h| h.bodies[corner.index()])
    }

    /// Cached state of a corner mass.
    #[must_use]
    pub fn corner_state(&self, corner: Corner) -> &BodyState {
        &self.corners[corner.index()]
    }

    /// Add the corner masses, springs, rope limiters and area limiters to a
    /// world.
    ///
    /// Any previous registration is forgotten.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a joint.
    pub fn register(&mut self, world: &mut dyn PhysicsWorld) -> Result<()> {
        let m = self.config.mass_side_length();
        let mass = self.config.mass / 4.0;
        let bodies = self.corners.map(|state| {
            world.add_body(
                BodyDesc::square(state.position, m, mass)
                    .with_angle(state.angle)
                    .with_velocity(state.linear_velocity)
                    .with_damping(self.config.linear_damping, self.config.angular_damping),
            )
        });

        let mut springs = Vec::with_capacity(self.springs.len());
        for spring in &self.springs {
            let id = world.add_joint(
                JointDesc::distance(
                    bodies[spring.a.index()],
                    bodies[spring.b.index()],
                    spring.anchor_a,
                    spring.anchor_b,
                    spring.range.rest(),
                )
                .with_softness(self.config.spring_frequency, self.config.spring_damping),
            )?;
            springs.push(id);
        }
        for (a, b, _, _) in SIDES {
            world.add_joint(JointDesc::rope(
                bodies[a.index()],
                bodies[b.index()],
                Vector2::zeros(),
                Vector2::zeros(),
                m,
            ))?;
        }
        for (a, b, min_length, max_length) in area_limits(&self.config) {
            world.add_joint(JointDesc::limit(
                bodies[a.index()],
                bodies[b.index()],
                outer_anchor(&self.config, a),
                outer_anchor(&self.config, b),
                min_length,
                max_length,
            ))?;
        }

        self.handles = Some(Handles { bodies, springs });
        self.structure_dirty = self.breakage.is_some();
        self.pending_force = Some(self.last_applied_force);
        Ok(())
    }

    /// Refresh the cached corner states from the world.
    ///
    /// # Errors
    ///
    /// Returns an error if a corner body is unknown to the world.
    pub fn sync_from_world(&mut self, world: &dyn PhysicsWorld) -> Result<()> {
        let Some(handles) = &self.handles else {
            return Ok(());
        };
        for (state, id) in self.corners.iter_mut().zip(handles.bodies) {
            *state = world
                .body_state(id)
                .ok_or(SimError::InvalidBodyId(id.index()))?;
        }
        Ok(())
    }

    /// Push pending actuation and structure changes into the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a body or joint handle.
    pub fn flush_to_world(&mut self, world: &mut dyn PhysicsWorld) -> Result<()> {
        let Some(handles) = &self.handles else {
            return Ok(());
        };

        if self.structure_dirty {
            let frozen = self
                .breakage
                .as_ref()
                .is_some_and(|b| b.malfunction(Component::Structure) == Malfunction::Frozen);
            let (frequency, damping) = if frozen {
                (0.0, 0.0)
            } else {
                (self.config.spring_frequency, self.config.spring_damping)
            };
            for id in &handles.springs {
                world.set_joint_softness(*id, frequency, damping)?;
            }
            self.structure_dirty = false;
        }

        let Some(f) = self.pending_force.take() else {
            return Ok(());
        };
        match self.config.actuation {
            ActuationMode::Distance => {
                for (id, spring) in handles.springs.iter().zip(&self.springs) {
                    world.set_joint_target(*id, spring.range.target(f))?;
                }
            }
            ActuationMode::Force => {
                let center = self.center();
                for (state, id) in self.corners.iter().zip(handles.bodies) {
                    let toward = center - state.position;
                    let norm = toward.norm();
                    if norm > 1e-12 {
                        world.apply_force(id, toward / norm * (f * self.config.max_force))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Move the cached geometry by `offset`.
    ///
    /// Only meaningful before registration: a registered voxel takes its
    /// geometry from the world at the next sync.
    pub fn translate(&mut self, offset: &Vector2<f64>) {
        for state in &mut self.corners {
            state.position += offset;
        }
    }

    /// Centers of the corner masses.
    #[must_use]
    pub fn mass_centers(&self) -> [Point2<f64>; 4] {
        self.corners.map(|s| s.position)
    }

    /// Mean of the corner mass centers.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        let sum = self
            .corners
            .iter()
            .fold(Vector2::zeros(), |acc, s| acc + s.position.coords);
        Point2::from(sum / 4.0)
    }

    /// Outer corners of the corner masses, counter-clockwise from
    /// south-west.
    #[must_use]
    pub fn polygon(&self) -> [Point2<f64>; 4] {
        Corner::ALL.map(|corner| {
            self.corners[corner.index()].world_point(&outer_anchor(&self.config, corner))
        })
    }

    /// Bounding box of all four corner masses.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let half = self.config.mass_side_length() / 2.0;
        let points: Vec<Point2<f64>> = self
            .corners
            .iter()
            .flat_map(|state| {
                Corner::ALL.map(|c| {
                    let (sx, sy) = c.signs();
                    state.world_point(&Vector2::new(sx * half, sy * half))
                })
            })
            .collect();
        let center = self.center();
        BoundingBox::from_points(&points).unwrap_or(BoundingBox::new(center, center))
    }

    /// Polygon area over rest area.
    #[must_use]
    pub fn area_ratio(&self) -> f64 {
        area(&self.polygon()) / self.config.rest_area()
    }

    /// Mean direction of the two vertical sides (`π/2` when upright).
    #[must_use]
    pub fn angle(&self) -> f64 {
        let p = self.mass_centers();
        let left = p[Corner::NorthWest.index()] - p[Corner::SouthWest.index()];
        let right = p[Corner::NorthEast.index()] - p[Corner::SouthEast.index()];
        let up = left.normalize() + right.normalize();
        up.y.atan2(up.x)
    }

    /// Mean linear velocity of the corner masses.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector2<f64> {
        self.corners
            .iter()
            .fold(Vector2::zeros(), |acc, s| acc + s.linear_velocity)
            / 4.0
    }

    /// Whether any corner mass touched the ground during the last step.
    #[must_use]
    pub fn is_touching_ground(&self) -> bool {
        self.corners.iter().any(|s| s.touching_ground)
    }

    /// Last actuation value applied.
    #[must_use]
    pub fn last_applied_force(&self) -> f64 {
        self.last_applied_force
    }

    /// Cumulative control energy.
    #[must_use]
    pub fn control_energy(&self) -> f64 {
        self.control_energy
    }

    /// Cumulative area-ratio energy.
    #[must_use]
    pub fn area_ratio_energy(&self) -> f64 {
        self.area_ratio_energy
    }

    /// Command an actuation value in `[-1, 1]`; positive values contract.
    ///
    /// Out-of-range values are clamped. Control energy grows by `f²` when
    /// the force works against the current deformation.
    pub fn apply_force(&mut self, f: f64) {
        let requested = if f.is_nan() { 0.0 } else { f.clamp(-1.0, 1.0) };
        let f = match &mut self.breakage {
            Some(breakage) => breakage.actuation(requested, self.last_applied_force),
            None => requested,
        };
        let ratio = self.area_ratio();
        if (ratio > 1.0 && f > 0.0) || (ratio < 1.0 && f < 0.0) {
            self.control_energy += f * f;
        }
        self.last_applied_force = f;
        self.pending_force = Some(f);
    }

    /// Update energies, malfunctions and sensor readings for time `t`.
    pub fn act(&mut self, t: f64) {
        let ratio = self.area_ratio();
        self.area_ratio_energy += (ratio - 1.0) * (ratio - 1.0);

        if let Some(breakage) = &mut self.breakage {
            if breakage.update(t, self.control_energy, self.area_ratio_energy) {
                self.structure_dirty = true;
            }
        }

        if self.sensors.is_empty() {
            return;
        }
        let mut sensors = std::mem::take(&mut self.sensors);
        let fresh: Vec<f64> = sensors.iter_mut().flat_map(|s| s.sense(self, t)).collect();
        self.sensors = sensors;
        let domains = self.sensor_domains();
        self.readings = match &mut self.breakage {
            Some(breakage) => breakage.readings(fresh, &self.readings, &domains),
            None => fresh,
        };
    }

    /// Readings computed by the last [`act`](Self::act).
    #[must_use]
    pub fn sensor_readings(&self) -> &[f64] {
        &self.readings
    }

    /// Domains of all sensor channels, in reading order.
    #[must_use]
    pub fn sensor_domains(&self) -> Vec<Domain> {
        self.sensors.iter().flat_map(|s| s.domains()).collect()
    }

    /// Number of sensor channels.
    #[must_use]
    pub fn num_sensor_channels(&self) -> usize {
        self.sensor_domains().len()
    }

    /// The malfunction state machine, if the voxel is breakable.
    #[must_use]
    pub fn breakage(&self) -> Option<&Breakage> {
        self.breakage.as_ref()
    }

    /// Whether any component is malfunctioning.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.breakage.as_ref().is_some_and(Breakage::is_broken)
    }

    /// Force a malfunction at time `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the voxel is not breakable or the component does
    /// not support the malfunction.
    pub fn break_now(&mut self, t: f64, component: Component, malfunction: Malfunction) -> Result<()> {
        let breakage = self
            .breakage
            .as_mut()
            .ok_or_else(|| SimError::invalid_config("voxel is not breakable"))?;
        if breakage.break_now(t, component, malfunction)? {
            self.structure_dirty = true;
        }
        Ok(())
    }

    /// Return to the rest shape at the origin, forgetting any world
    /// registration, energies, sensor state and malfunctions.
    pub fn reset(&mut self) {
        self.corners = rest_corners(&self.config);
        self.handles = None;
        self.readings.clear();
        for sensor in &mut self.sensors {
            sensor.reset();
        }
        if let Some(breakage) = &mut self.breakage {
            breakage.reset();
        }
        self.last_applied_force = 0.0;
        self.pending_force = None;
        self.control_energy = 0.0;
        self.area_ratio_energy = 0.0;
        self.structure_dirty = false;
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn poly(&self) -> VoxelPoly {
        VoxelPoly {
            vertices: self.polygon(),
            angle: self.angle(),
            linear_velocity: self.linear_velocity(),
            touching_ground: self.is_touching_ground(),
            area_ratio: self.area_ratio(),
            area_ratio_energy: self.area_ratio_energy,
            last_applied_force: self.last_applied_force,
            control_energy: self.control_energy,
            malfunctions: self
                .breakage
                .as_ref()
                .map(|b| b.state().clone())
                .unwrap_or_else(BTreeMap::new),
        }
    }

    #[cfg(test)]
    pub(crate) fn add_control_energy(&mut self, energy: f64) {
        self.control_energy += energy;
    }
}

fn rest_corners(config: &VoxelConfig) -> [BodyState; 4] {
    let half = config.side_length / 2.0;
    let offset = half - config.mass_side_length() / 2.0;
    Corner::ALL.map(|corner| {
        let (sx, sy) = corner.signs();
        BodyState {
            position: Point2::new(half + sx * offset, half + sy * offset),
            angle: 0.0,
            linear_velocity: Vector2::zeros(),
            angular_velocity: 0.0,
            touching_ground: false,
        }
    })
}

/// Local offset of a corner mass's outer vertex.
fn outer_anchor(config: &VoxelConfig, corner: Corner) -> Vector2<f64> {
    let half = config.mass_side_length() / 2.0;
    let (sx, sy) = corner.signs();
    Vector2::new(sx * half, sy * half)
}

/// `(a, b, min, max)` distance limits between outer vertices: the four
/// polygon edges, then the two diagonals.
///
/// Edges within `[s_min, s_max]` and diagonals within `√2·[s_min, s_max]`
/// pin the polygon area between `s_min²` and `s_max²`.
fn area_limits(config: &VoxelConfig) -> [(Corner, Corner, f64, f64); 6] {
    let delta = config.area_ratio_max_delta * (1.0 - LIMIT_MARGIN);
    let s_min = config.side_length * (1.0 - delta).sqrt();
    let s_max = config.side_length * (1.0 + delta).sqrt();
    let (d_min, d_max) = (s_min * std::f64::consts::SQRT_2, s_max * std::f64::consts::SQRT_2);
    [
        (Corner::SouthWest, Corner::SouthEast, s_min, s_max),
        (Corner::SouthEast, Corner::NorthEast, s_min, s_max),
        (Corner::NorthEast, Corner::NorthWest, s_min, s_max),
        (Corner::NorthWest, Corner::SouthWest, s_min, s_max),
        (Corner::SouthWest, Corner::NorthEast, d_min, d_max),
        (Corner::SouthEast, Corner::NorthWest, d_min, d_max),
    ]
}

fn build_springs(config: &VoxelConfig) -> Result<Vec<Spring>> {
    let h = config.mass_side_length() / 2.0;
    let anchor = |along: (f64, f64), across: (f64, f64), s: f64, t: f64| {
        Vector2::new(along.0 * s + across.0 * t, along.1 * s + across.1 * t) * h
    };
    let mut springs = Vec::new();
    for scaffolding in &config.scaffoldings {
        let range = config.spring_range(*scaffolding)?;
        let mut push = |a: Corner, b: Corner, anchor_a: Vector2<f64>, anchor_b: Vector2<f64>| {
            springs.push(Spring {
                a,
                b,
                anchor_a,
                anchor_b,
                range,
            });
        };
        match scaffolding {
            SpringScaffolding::SideInternal => {
                for (a, b, along, out) in SIDES {
                    for t in [-1.0, 1.0] {
                        push(a, b, anchor(along, out, 1.0, t), anchor(along, out, -1.0, t));
                    }
                }
            }
            SpringScaffolding::SideExternal => {
                for (a, b, along, out) in SIDES {
                    push(a, b, anchor(along, out, -1.0, 1.0), anchor(along, out, 1.0, 1.0));
                }
            }
            SpringScaffolding::SideCross => {
                for (a, b, along, out) in SIDES {
                    for t in [-1.0, 1.0] {
                        push(a, b, anchor(along, out, 1.0, t), anchor(along, out, -1.0, -t));
                    }
                }
            }
            SpringScaffolding::CentralCross => {
                let inner = |c: Corner| {
                    let (sx, sy) = c.signs();
                    Vector2::new(-sx * h, -sy * h)
                };
                push(
                    Corner::SouthWest,
                    Corner::NorthEast,
                    inner(Corner::SouthWest),
                    inner(Corner::NorthEast),
                );
                push(
                    Corner::SouthEast,
                    Corner::NorthWest,
                    inner(Corner::SouthEast),
                    inner(Corner::NorthWest),
                );
            }
        }
    }
    Ok(springs)
}
