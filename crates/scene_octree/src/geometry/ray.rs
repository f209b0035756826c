//! Rays for raycasts and picking
//!
//! Hit distances are returned as `f32`, with `f32::INFINITY` meaning "no
//! hit", so callers can compare them directly against a maximum distance.

use super::{Aabb, Sphere, Triangle};
use crate::foundation::math::{Mat4, Point3, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction (normalized here)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Whether the direction is finite and non-zero
    pub fn has_direction(&self) -> bool {
        self.direction.iter().all(|c| c.is_finite()) && self.direction != Vec3::zeros()
    }

    /// Get a point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through an affine transform.
    ///
    /// The direction is deliberately left unnormalized so that a hit at
    /// parameter `t` in the transformed space is the same point as `t` on
    /// the original ray, which keeps local-space hit distances in world units.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point(&Point3::from(self.origin)).coords,
            direction: matrix.transform_vector(&self.direction),
        }
    }

    /// Distance from the origin to the closest point on the ray
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let to_point = point - self.origin;
        let length_squared = self.direction.magnitude_squared();
        if length_squared == 0.0 {
            return to_point.magnitude();
        }
        let t = (to_point.dot(&self.direction) / length_squared).max(0.0);
        (point - self.point_at(t)).magnitude()
    }

    /// Entry distance into a box using the slab method
    ///
    /// Zero when the origin is inside the box, `f32::INFINITY` on a miss.
    /// A zero or non-finite direction misses everything.
    pub fn hit_distance_aabb(&self, aabb: &Aabb) -> f32 {
        if !aabb.is_valid() || !self.has_direction() {
            return f32::INFINITY;
        }
        if aabb.contains_point(self.origin) {
            return 0.0;
        }

        let inv_dir = Vec3::new(
            if self.direction.x != 0.0 { 1.0 / self.direction.x } else { f32::INFINITY },
            if self.direction.y != 0.0 { 1.0 / self.direction.y } else { f32::INFINITY },
            if self.direction.z != 0.0 { 1.0 / self.direction.z } else { f32::INFINITY },
        );

        let t1 = (aabb.min.x - self.origin.x) * inv_dir.x;
        let t2 = (aabb.max.x - self.origin.x) * inv_dir.x;
        let t3 = (aabb.min.y - self.origin.y) * inv_dir.y;
        let t4 = (aabb.max.y - self.origin.y) * inv_dir.y;
        let t5 = (aabb.min.z - self.origin.z) * inv_dir.z;
        let t6 = (aabb.max.z - self.origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            tmin.max(0.0)
        } else {
            f32::INFINITY
        }
    }

    /// Nearest non-negative hit against a sphere
    pub fn hit_distance_sphere(&self, sphere: &Sphere) -> f32 {
        let oc = self.origin - sphere.center;
        let a = self.direction.dot(&self.direction);
        let b = 2.0 * oc.dot(&self.direction);
        let c = oc.dot(&oc) - sphere.radius * sphere.radius;

        if c <= 0.0 {
            return 0.0;
        }
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 || a == 0.0 {
            return f32::INFINITY;
        }

        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        if t >= 0.0 { t } else { f32::INFINITY }
    }

    /// Nearest hit against a single triangle
    pub fn hit_distance_triangle(&self, triangle: &Triangle) -> f32 {
        triangle.intersect_ray(self).map_or(f32::INFINITY, |(t, _, _)| t)
    }

    /// Nearest hit over a triangle list
    pub fn hit_distance_triangles(&self, triangles: &[Triangle]) -> f32 {
        triangles
            .iter()
            .map(|triangle| self.hit_distance_triangle(triangle))
            .fold(f32::INFINITY, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> Aabb {
        Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_hit_distance_aabb() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::x());
        assert_relative_eq!(ray.hit_distance_aabb(&unit()), 2.0, epsilon = 1e-5);

        let miss = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::x());
        assert_eq!(miss.hit_distance_aabb(&unit()), f32::INFINITY);

        let inside = Ray::new(Vec3::repeat(0.5), Vec3::x());
        assert_eq!(inside.hit_distance_aabb(&unit()), 0.0);

        let away = Ray::new(Vec3::new(-2.0, 0.5, 0.5), -Vec3::x());
        assert_eq!(away.hit_distance_aabb(&unit()), f32::INFINITY);
    }

    #[test]
    fn test_degenerate_direction_misses() {
        // Normalizing a zero vector yields NaN
        let zero = Ray::new(Vec3::repeat(0.5), Vec3::zeros());
        assert!(!zero.has_direction());
        assert_eq!(zero.hit_distance_aabb(&unit()), f32::INFINITY);

        let raw_zero = Ray { origin: Vec3::repeat(0.5), direction: Vec3::zeros() };
        assert_eq!(raw_zero.hit_distance_aabb(&unit()), f32::INFINITY);
    }

    #[test]
    fn test_hit_distance_sphere() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::z());
        let sphere = Sphere::new(Vec3::zeros(), 2.0);
        assert_relative_eq!(ray.hit_distance_sphere(&sphere), 8.0, epsilon = 1e-5);

        let behind = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::z());
        assert_eq!(behind.hit_distance_sphere(&sphere), f32::INFINITY);
    }

    #[test]
    fn test_transformed_preserves_parameter() {
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::x());
        let world_to_local = Mat4::new_nonuniform_scaling(&Vec3::new(0.5, 0.5, 0.5));
        let local = ray.transformed(&world_to_local);

        // Local box [-1, 1] is the world box [-2, 2]: entered at world distance 8
        let local_box = Aabb::cube(Vec3::zeros(), 1.0);
        assert_relative_eq!(local.hit_distance_aabb(&local_box), 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_distance_to_point() {
        let ray = Ray::new(Vec3::zeros(), Vec3::x());
        assert_relative_eq!(ray.distance_to_point(Vec3::new(5.0, 3.0, 0.0)), 3.0);
        assert_relative_eq!(ray.distance_to_point(Vec3::new(-4.0, 3.0, 0.0)), 5.0);
    }
}
