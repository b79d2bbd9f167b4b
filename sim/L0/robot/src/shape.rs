//! Body shapes.

use sim_types::{Grid, Result};
use sim_voxel::Voxel;

/// Populate the cells of a shape mask with voxels built by `factory(x, y)`.
///
/// # Errors
///
/// Returns the first error produced by `factory`.
pub fn build_body(
    shape: &Grid<bool>,
    mut factory: impl FnMut(usize, usize) -> Result<Voxel>,
) -> Result<Grid<Option<Voxel>>> {
    let mut cells = Vec::with_capacity(shape.width() * shape.height());
    for (x, y, populated) in shape.iter() {
        cells.push(if *populated { Some(factory(x, y)?) } else { None });
    }
    let mut cells = cells.into_iter();
    Ok(Grid::from_fn(shape.width(), shape.height(), |_, _| {
        cells.next().flatten()
    }))
}

/// Whether the populated cells form a single 4-connected component.
#[must_use]
pub fn is_connected(shape: &Grid<bool>) -> bool {
    let (w, h) = shape.size();
    let Some((sx, sy, _)) = shape.iter().find(|(_, _, p)| **p) else {
        return false;
    };
    let mut seen = Grid::filled(w, h, false);
    let mut stack = vec![(sx, sy)];
    seen.set(sx, sy, true);
    let mut reached = 0;
    while let Some((x, y)) = stack.pop() {
        reached += 1;
        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if shape.get(nx, ny) == Some(&true) && seen.get(nx, ny) == Some(&false) {
                seen.set(nx, ny, true);
                stack.push((nx, ny));
            }
        }
    }
    reached == shape.values().filter(|p| **p).count()
}
