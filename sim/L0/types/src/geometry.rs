//! 2D geometry helpers: bounding boxes and polygon measures.

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Lower-left corner.
    pub min: Point2<f64>,
    /// Upper-right corner.
    pub max: Point2<f64>,
}

impl BoundingBox {
    /// Create a bounding box from its corners.
    #[must_use]
    pub const fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all `points`, or `None` if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |bb, p| {
            Self::new(
                Point2::new(bb.min.x.min(p.x), bb.min.y.min(p.y)),
                Point2::new(bb.max.x.max(p.x), bb.max.y.max(p.y)),
            )
        }))
    }

    /// Smallest box enclosing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The same box shifted by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector2<f64>) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }
}

/// Signed area of a simple polygon (shoelace formula).
///
/// Positive for counter-clockwise vertex order.
#[must_use]
pub fn signed_area(vertices: &[Point2<f64>]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Unsigned area of a simple polygon.
#[must_use]
pub fn area(vertices: &[Point2<f64>]) -> f64 {
    signed_area(vertices).abs()
}

/// Unweighted mean of the vertices, or `None` for an empty slice.
#[must_use]
pub fn vertex_mean(vertices: &[Point2<f64>]) -> Option<Point2<f64>> {
    if vertices.is_empty() {
        return None;
    }
    let sum = vertices
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords);
    Some(Point2::from(sum / vertices.len() as f64))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_shoelace() {
        let sq = unit_square();
        assert_relative_eq!(signed_area(&sq), 1.0);

        let mut cw = sq.clone();
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -1.0);
        assert_relative_eq!(area(&cw), 1.0);

        assert_relative_eq!(area(&sq[..2]), 0.0);
    }

    #[test]
    fn test_vertex_mean() {
        let c = vertex_mean(&unit_square()).unwrap();
        assert_relative_eq!(c.x, 0.5);
        assert_relative_eq!(c.y, 0.5);
        assert!(vertex_mean(&[]).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox::from_points(&unit_square()).unwrap();
        assert_relative_eq!(bb.width(), 1.0);
        assert_relative_eq!(bb.height(), 1.0);

        let other = bb.translated(&Vector2::new(2.0, -1.0));
        let u = bb.union(&other);
        assert_relative_eq!(u.min.y, -1.0);
        assert_relative_eq!(u.max.x, 3.0);
        assert_relative_eq!(u.center().x, 1.5);

        let empty: [Point2<f64>; 0] = [];
        assert!(BoundingBox::from_points(&empty).is_none());
    }
}
