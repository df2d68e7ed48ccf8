//! Axis-aligned bounding boxes.

use super::{Point, Point3F};
use crate::Coord;
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box in scaled coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    defined: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// Create an empty (undefined) bounding box.
    pub fn new() -> Self {
        Self {
            min: Point::new(Coord::MAX, Coord::MAX),
            max: Point::new(Coord::MIN, Coord::MIN),
            defined: false,
        }
    }

    /// Whether no point has been included yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.defined
    }

    /// Extend the box to include a point.
    pub fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.defined = true;
    }

    /// Extend the box to cover another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if !other.defined {
            return;
        }
        self.include(other.min);
        self.include(other.max);
    }

    /// Width in scaled units.
    #[inline]
    pub fn width(&self) -> Coord {
        if self.defined {
            self.max.x - self.min.x
        } else {
            0
        }
    }

    /// Height in scaled units.
    #[inline]
    pub fn height(&self) -> Coord {
        if self.defined {
            self.max.y - self.min.y
        } else {
            0
        }
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2,
            (self.min.y + self.max.y) / 2,
        )
    }
}

/// 3D axis-aligned bounding box in millimeters, used for mesh bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3F {
    pub min: Point3F,
    pub max: Point3F,
}

impl BoundingBox3F {
    /// Compute the bounding box of a set of vertices.
    ///
    /// Returns `None` for an empty set.
    pub fn from_points(points: &[Point3F]) -> Option<Self> {
        let first = *points.first()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.min.z = bbox.min.z.min(p.z);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
            bbox.max.z = bbox.max.z.max(p.z);
        }
        Some(bbox)
    }

    /// Extents along each axis.
    #[inline]
    pub fn size(&self) -> Point3F {
        Point3F::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}

/// Millimeter extents helper for diagnostics.
impl std::fmt::Display for BoundingBox3F {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(f, "{:.2} x {:.2} x {:.2} mm", s.x, s.y, s.z)
    }
}
