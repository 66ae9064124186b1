use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::correspondence::Point3;

/// Rectangular area of interest in UTM coordinates.
///
/// `(x, y)` is the upper-left corner (easting, northing); `w` and `h` are the
/// extent in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    /// Easting of the upper-left corner.
    pub x: f64,
    /// Northing of the upper-left corner.
    pub y: f64,
    /// Width along the easting axis.
    pub w: f64,
    /// Height along the northing axis.
    pub h: f64,
}

impl AreaOfInterest {
    /// Lower-left corner `(x, y - h, 0)`, used as the origin of the local frame.
    pub fn origin(&self) -> Point3 {
        DVec3::new(self.x, self.y - self.h, 0.0)
    }
}

/// Local east-north-up frame obtained by shifting absolute coordinates.
///
/// Heights are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    origin: Point3,
}

impl LocalFrame {
    /// Create a local frame centered at `origin`.
    pub fn new(origin: Point3) -> Self {
        Self { origin }
    }

    /// Local frame anchored at the lower-left corner of an area of interest.
    pub fn from_aoi(aoi: &AreaOfInterest) -> Self {
        Self::new(aoi.origin())
    }

    /// Origin of the frame in absolute coordinates.
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// Absolute to local coordinates.
    #[inline]
    pub fn to_local(&self, point: Point3) -> Point3 {
        point - self.origin
    }

    /// Local to absolute coordinates.
    #[inline]
    pub fn to_global(&self, point: Point3) -> Point3 {
        point + self.origin
    }

    /// Absolute to local coordinates for a sequence of points.
    pub fn to_local_batch(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|&p| self.to_local(p)).collect()
    }

    /// Local to absolute coordinates for a sequence of points.
    pub fn to_global_batch(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|&p| self.to_global(p)).collect()
    }
}
