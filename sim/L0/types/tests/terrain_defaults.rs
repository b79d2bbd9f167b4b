//! Default terrain dimensions as seen by downstream crates.

use approx::assert_relative_eq;
use sim_types::{TerrainProfile, GROUND_LEVEL, TERRAIN_LENGTH, WALL_HEIGHT, WALL_WIDTH};

#[test]
fn test_default_flat_terrain_from_root_constants() {
    let terrain = TerrainProfile::flat(TERRAIN_LENGTH, GROUND_LEVEL, WALL_WIDTH, WALL_HEIGHT).unwrap();
    assert_relative_eq!(terrain.max_x(), TERRAIN_LENGTH);
    assert_relative_eq!(terrain.y_at(TERRAIN_LENGTH / 2.0), GROUND_LEVEL);
    assert_relative_eq!(terrain.y_at(0.0), WALL_HEIGHT);
    assert_relative_eq!(terrain.y_at(TERRAIN_LENGTH), WALL_HEIGHT);
}
