//! Dense rectangular grid addressed by `(x, y)`, with `y` growing upward.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// A `w × h` grid stored row-major (row `y = 0` first).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid<T> {
    w: usize,
    h: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid by calling `f(x, y)` for every cell.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                cells.push(f(x, y));
            }
        }
        Self { w, h, cells }
    }

    /// Width (number of columns).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.w
    }

    /// Height (number of rows).
    #[must_use]
    pub const fn height(&self) -> usize {
        self.h
    }

    /// `(width, height)`.
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.w && y < self.h).then(|| y * self.w + x)
    }

    /// Cell at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(x, y)`, or `None` when out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// Replace the cell at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    /// Iterate `(x, y, &cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let w = self.w;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (i % w, i / w, c))
    }

    /// Iterate `(x, y, &mut cell)` in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let w = self.w;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(i, c)| (i % w, i / w, c))
    }

    /// Iterate cells in row-major order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Iterate cells mutably in row-major order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    /// A grid of the same size with every cell mapped through `f`.
    pub fn map<U>(&self, mut f: impl FnMut(usize, usize, &T) -> U) -> Grid<U> {
        Grid::from_fn(self.w, self.h, |x, y| f(x, y, &self.cells[y * self.w + x]))
    }
}

impl<T: Clone> Grid<T> {
    /// A grid filled with copies of `value`.
    pub fn filled(w: usize, h: usize, value: T) -> Self {
        Self {
            w,
            h,
            cells: vec![value; w * h],
        }
    }
}

impl<T> Grid<Option<T>> {
    /// Iterate `(x, y, &value)` over populated cells.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.iter()
            .filter_map(|(x, y, c)| c.as_ref().map(|v| (x, y, v)))
    }

    /// Iterate `(x, y, &mut value)` over populated cells.
    pub fn occupied_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        self.iter_mut()
            .filter_map(|(x, y, c)| c.as_mut().map(|v| (x, y, v)))
    }

    /// Number of populated cells.
    #[must_use]
    pub fn count_occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl Grid<bool> {
    /// Parse a shape mask such as `"111|101"`.
    ///
    /// Rows are separated by `|` and listed top row first; `1` marks a
    /// populated cell and `0` an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidShape`] for empty input, ragged rows or
    /// characters other than `0`/`1`.
    pub fn from_mask(mask: &str) -> Result<Self> {
        let rows: Vec<&str> = mask.split('|').collect();
        let w = rows.first().map_or(0, |r| r.len());
        if w == 0 {
            return Err(SimError::invalid_shape("empty mask"));
        }
        if rows.iter().any(|r| r.len() != w) {
            return Err(SimError::invalid_shape(format!(
                "rows of '{mask}' have different lengths"
            )));
        }
        let h = rows.len();
        let mut grid = Self::filled(w, h, false);
        for (row, line) in rows.iter().enumerate() {
            let y = h - 1 - row;
            for (x, c) in line.chars().enumerate() {
                match c {
                    '1' => grid.set(x, y, true),
                    '0' => {}
                    other => {
                        return Err(SimError::invalid_shape(format!(
                            "unexpected character '{other}' in '{mask}'"
                        )));
                    }
                }
            }
        }
        Ok(grid)
    }

    /// A fully populated `w × h` mask.
    #[must_use]
    pub fn rectangle(w: usize, h: usize) -> Self {
        Self::filled(w, h, true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let g = Grid::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(g.size(), (3, 2));
        assert_eq!(g.get(2, 1), Some(&12));
        assert_eq!(g.get(3, 0), None);
        let order: Vec<_> = g.values().copied().collect();
        assert_eq!(order, vec![0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_occupied() {
        let mut g: Grid<Option<u8>> = Grid::filled(2, 2, None);
        g.set(1, 0, Some(4));
        g.set(0, 1, Some(7));
        assert_eq!(g.count_occupied(), 2);
        let cells: Vec<_> = g.occupied().map(|(x, y, v)| (x, y, *v)).collect();
        assert_eq!(cells, vec![(1, 0, 4), (0, 1, 7)]);
    }

    #[test]
    fn test_mask_top_row_first() {
        let g = Grid::from_mask("110|011").unwrap();
        assert_eq!(g.size(), (3, 2));
        // Bottom row is "011"
        assert_eq!(g.get(0, 0), Some(&false));
        assert_eq!(g.get(2, 0), Some(&true));
        // Top row is "110"
        assert_eq!(g.get(0, 1), Some(&true));
        assert_eq!(g.get(2, 1), Some(&false));
    }

    #[test]
    fn test_bad_masks() {
        assert!(Grid::from_mask("").is_err());
        assert!(Grid::from_mask("11|1").is_err());
        assert!(Grid::from_mask("1x").is_err());
    }
}
