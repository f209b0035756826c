//! Axis-aligned bounding box
//!
//! Comparisons are written so that a box containing NaN (or with `min`
//! above `max`) fails every containment and overlap test.

use serde::{Deserialize, Serialize};

use super::Intersection;
use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Cube centered on `center` with the given half-size
    pub fn cube(center: Vec3, half_size: f32) -> Self {
        Self::from_center_half_extents(center, Vec3::repeat(half_size))
    }

    /// Smallest box enclosing all points, `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for point in iter {
            aabb.expand_to_point(point);
        }
        Some(aabb)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the half-extents of the AABB
    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Whether `min <= max` on every axis. False for any NaN component.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies completely within this AABB
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.is_valid() &&
        other.min.x >= self.min.x && other.max.x <= self.max.x &&
        other.min.y >= self.min.y && other.max.y <= self.max.y &&
        other.min.z >= self.min.z && other.max.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.is_valid() && other.is_valid() &&
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Classify `other` against this box used as a query volume
    pub fn test_aabb(&self, other: &Aabb) -> Intersection {
        if !self.intersects(other) {
            Intersection::Outside
        } else if self.contains_aabb(other) {
            Intersection::Inside
        } else {
            Intersection::Intersects
        }
    }

    /// Closest point inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.max(self.min.x).min(self.max.x),
            point.y.max(self.min.y).min(self.max.y),
            point.z.max(self.min.z).min(self.max.z),
        )
    }

    /// Squared distance from `point` to the box (zero when inside)
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let dx = (self.min.x - point.x).max(0.0).max(point.x - self.max.x);
        let dy = (self.min.y - point.y).max(0.0).max(point.y - self.max.y);
        let dz = (self.min.z - point.z).max(0.0).max(point.z - self.max.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Distance from `point` to the box (zero when inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.distance_squared_to_point(point).sqrt()
    }

    /// Grow the box to include a point
    pub fn expand_to_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Return merged AABB containing both
    #[must_use]
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The eight corners, indexed with bit 0 = x, bit 1 = y, bit 2 = z
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// World-space box enclosing this box after an affine transform
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self
            .corners()
            .map(|corner| matrix.transform_point(&Point3::from(corner)).coords);
        let mut aabb = Aabb::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            aabb.expand_to_point(*corner);
        }
        aabb
    }

    /// Get child octant AABB for octree subdivision
    ///
    /// Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    pub fn child_octant(&self, index: usize) -> Aabb {
        let center = self.center();
        Aabb {
            min: Vec3::new(
                if index & 1 == 0 { self.min.x } else { center.x },
                if index & 2 == 0 { self.min.y } else { center.y },
                if index & 4 == 0 { self.min.z } else { center.z },
            ),
            max: Vec3::new(
                if index & 1 == 0 { center.x } else { self.max.x },
                if index & 2 == 0 { center.y } else { self.max.y },
                if index & 4 == 0 { center.z } else { self.max.z },
            ),
        }
    }

    /// Octant index (0-7) of a point relative to this box's center
    pub fn octant_of(&self, point: Vec3) -> usize {
        let center = self.center();
        let x_bit = usize::from(point.x >= center.x);
        let y_bit = usize::from(point.y >= center.y);
        let z_bit = usize::from(point.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }
}
