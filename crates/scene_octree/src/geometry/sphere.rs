//! Bounding sphere

use super::{Aabb, Intersection};
use crate::foundation::math::Vec3;

/// A bounding sphere for proximity queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies inside or on the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Distance from the sphere surface to a point (zero when inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        ((point - self.center).magnitude() - self.radius).max(0.0)
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Sphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Classify a box against this sphere.
    ///
    /// Uses the closest point for rejection and the farthest corner for
    /// full containment.
    pub fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        let finite_center = self.center.iter().all(|c| c.is_finite());
        if !finite_center || !aabb.is_valid() || self.radius.is_nan() || self.radius < 0.0 {
            return Intersection::Outside;
        }

        let radius_squared = self.radius * self.radius;
        if aabb.distance_squared_to_point(self.center) > radius_squared {
            return Intersection::Outside;
        }

        let farthest = Vec3::new(
            (self.center.x - aabb.min.x).abs().max((aabb.max.x - self.center.x).abs()),
            (self.center.y - aabb.min.y).abs().max((aabb.max.y - self.center.y).abs()),
            (self.center.z - aabb.min.z).abs().max((aabb.max.z - self.center.z).abs()),
        );
        if farthest.magnitude_squared() <= radius_squared {
            Intersection::Inside
        } else {
            Intersection::Intersects
        }
    }
}
