//! Property-based tests for voxel actuation and malfunctions.
//!
//! Run with: cargo test -p sim-voxel -- proptest

use proptest::prelude::*;
use sim_core::{PhysicsWorld, World};
use sim_types::WorldSettings;
use sim_voxel::{BreakageConfig, Component, Malfunction, Voxel, VoxelConfig};

const STEP: f64 = 1.0 / 60.0;

fn floating() -> (World, Voxel) {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let mut voxel = Voxel::new(VoxelConfig::default()).unwrap();
    voxel.register(&mut world).unwrap();
    (world, voxel)
}

fn run(world: &mut World, voxel: &mut Voxel, forces: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut energies = Vec::new();
    for f in forces {
        voxel.apply_force(f);
        voxel.flush_to_world(world).unwrap();
        world.step().unwrap();
        voxel.sync_from_world(world).unwrap();
        voxel.act(world.time());
        energies.push(voxel.control_energy());
    }
    energies
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Under any actuation sequence the area ratio stays within the
    /// configured delta at every step.
    #[test]
    fn proptest_area_ratio_bounded(
        commands in prop::collection::vec((-1.0..=1.0f64, 1usize..30), 1..40),
    ) {
        let (mut world, mut voxel) = floating();
        let delta = VoxelConfig::default().area_ratio_max_delta;
        for (step, f) in commands
            .into_iter()
            .flat_map(|(f, hold)| std::iter::repeat(f).take(hold))
            .enumerate()
        {
            run(&mut world, &mut voxel, [f]);
            let ratio = voxel.area_ratio();
            prop_assert!(ratio >= 1.0 - delta, "ratio {} at step {} (f={})", ratio, step, f);
            prop_assert!(ratio <= 1.0 + delta, "ratio {} at step {} (f={})", ratio, step, f);
        }
    }

    #[test]
    fn proptest_control_energy_monotonic(forces in prop::collection::vec(-1.5..1.5f64, 1..90)) {
        let (mut world, mut voxel) = floating();
        let energies = run(&mut world, &mut voxel, forces);
        prop_assert!(energies.windows(2).all(|w| w[1] >= w[0]));
        prop_assert!(energies.iter().all(|e| *e >= 0.0));
    }

    #[test]
    fn proptest_restore_after_quiet_period(restore in 0.1..5.0f64, eps in 1e-6..1.0f64) {
        let mut voxel = Voxel::new(VoxelConfig::default())
            .unwrap()
            .with_breakage(BreakageConfig::new(42).with_restore_time(restore))
            .unwrap();
        voxel.break_now(0.0, Component::Actuator, Malfunction::Frozen).unwrap();
        prop_assert!(voxel.is_broken());
        voxel.act(restore + eps);
        prop_assert!(!voxel.is_broken());
    }
}

#[test]
fn test_area_ratio_tracks_actuation_over_time() {
    let (mut world, mut voxel) = floating();
    let delta = VoxelConfig::default().area_ratio_max_delta;
    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    for i in 0..600 {
        run(&mut world, &mut voxel, [(f64::from(i) * STEP * 2.0).sin()]);
        let ratio = voxel.area_ratio();
        assert!((1.0 - delta..=1.0 + delta).contains(&ratio), "ratio {ratio} at step {i}");
        lowest = lowest.min(ratio);
        highest = highest.max(ratio);
    }
    // The sweep reaches both sides of the rest area
    assert!(lowest < 1.0 && highest > 1.0);
}
