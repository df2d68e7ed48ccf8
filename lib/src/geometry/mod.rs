//! Geometry primitives for the slicer.
//!
//! This module provides the fundamental geometric types used throughout the
//! slicing pipeline:
//! - [`Point`] and [`PointF`] - 2D points with scaled integer / unscaled
//!   floating-point coordinates
//! - [`Point3F`] - 3D mesh vertex in millimeters
//! - [`Polygon`] - Closed polygon boundary
//! - [`Polyline`] - Open path
//! - [`ExPolygon`] - Polygon with holes (flat contour + holes form)
//! - [`BoundingBox`] and [`BoundingBox3F`] - Axis-aligned bounding boxes
//!
//! ## Coordinate System
//!
//! The slicer uses scaled integer coordinates internally to avoid
//! floating-point precision issues. Coordinates are scaled by
//! `SCALING_FACTOR` (1,000,000), so 1 unit = 1 nanometer.
//!
//! - Use `scale()` to convert from mm to internal units
//! - Use `unscale()` to convert from internal units to mm

mod bounding_box;
mod expolygon;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::{BoundingBox, BoundingBox3F};
pub use expolygon::{region_contains_point, ExPolygon, ExPolygons};
pub use point::{Point, Point3F, PointF};
pub use polygon::{Polygon, Polygons};
pub use polyline::Polyline;
