//! View frustum for visibility culling

use super::{Aabb, Intersection, Sphere};
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Plane defined by normal and distance from origin
///
/// Points with a non-negative signed distance are on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized unless the plane is degenerate)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane through `point` facing `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let distance = -normal.dot(&point);
        Self { normal, distance }
    }

    /// Plane that every point lies in front of
    pub fn accept_all() -> Self {
        Self { normal: Vec3::new(0.0, 0.0, 0.0), distance: 1.0 }
    }

    /// Plane that every point lies behind
    pub fn reject_all() -> Self {
        Self { normal: Vec3::new(0.0, 0.0, 0.0), distance: -1.0 }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Normalize raw (a, b, c, d) plane coefficients
    fn from_coefficients(raw: Vec4) -> Self {
        let normal = raw.xyz();
        let length = normal.magnitude();
        if length > 0.0 && length.is_finite() {
            Self { normal: normal / length, distance: raw.w / length }
        } else {
            Self::reject_all()
        }
    }
}

/// Set of frustum planes still to be tested, bit `i` standing for `planes[i]`
///
/// A box fully on the inner side of a plane has every descendant there too,
/// so traversals pass the narrowed mask down and skip that plane below it.
pub type PlaneMask = u8;

/// Mask that tests all six planes
pub const ALL_PLANES: PlaneMask = 0b11_1111;

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Frustum that classifies every valid box as inside
    pub fn accept_all() -> Self {
        Self::new([Plane::accept_all(); 6])
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for OpenGL-style clip space
    /// (`-w <= x, y, z <= w`). A degenerate matrix yields planes that
    /// reject everything.
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let m = view_projection;
        let row = |i: usize| Vec4::new(m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 + r1), // bottom
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r3 + r2), // near
                Plane::from_coefficients(r3 - r2), // far
            ],
        }
    }

    /// Test if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if a sphere is inside or touches the frustum
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }

    /// Classify a box against all six planes
    pub fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        self.test_aabb_masked(aabb, ALL_PLANES).0
    }

    /// Classify a box against the planes selected by `mask`
    ///
    /// Also returns the planes the box straddles, which is the mask to use
    /// for anything contained in the box. An empty mask classifies every
    /// valid box as `Inside`.
    pub fn test_aabb_masked(&self, aabb: &Aabb, mask: PlaneMask) -> (Intersection, PlaneMask) {
        if !aabb.is_valid() {
            return (Intersection::Outside, mask);
        }

        let center = aabb.center();
        let extents = aabb.half_extents();
        let mut remaining = mask;

        for (i, plane) in self.planes.iter().enumerate() {
            let bit = 1 << i;
            if mask & bit == 0 {
                continue;
            }
            let distance = plane.distance_to_point(center);
            let projected_radius = plane.normal.abs().dot(&extents);

            if distance.is_nan() || distance < -projected_radius {
                return (Intersection::Outside, mask);
            }
            if distance >= projected_radius {
                remaining &= !bit;
            }
        }

        if remaining == 0 {
            (Intersection::Inside, 0)
        } else {
            (Intersection::Intersects, remaining)
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.test_aabb(aabb).is_hit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;

    fn camera_frustum() -> Frustum {
        // Camera at origin looking down -Z
        let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_matrix(&projection)
    }

    #[test]
    fn test_extracted_planes_are_normalized() {
        for plane in &camera_frustum().planes {
            assert!((plane.normal.magnitude() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_box_in_front_of_camera() {
        let frustum = camera_frustum();
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert_eq!(frustum.test_aabb(&aabb), Intersection::Inside);
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -50.0)));
    }

    #[test]
    fn test_box_behind_or_beyond_is_outside() {
        let frustum = camera_frustum();
        let behind = Aabb::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        let beyond = Aabb::new(Vec3::new(-1.0, -1.0, -200.0), Vec3::new(1.0, 1.0, -150.0));
        let left = Aabb::new(Vec3::new(-1000.0, -1.0, -10.0), Vec3::new(-999.0, 1.0, -5.0));

        assert_eq!(frustum.test_aabb(&behind), Intersection::Outside);
        assert_eq!(frustum.test_aabb(&beyond), Intersection::Outside);
        assert_eq!(frustum.test_aabb(&left), Intersection::Outside);
    }

    #[test]
    fn test_box_crossing_far_plane_intersects() {
        let frustum = camera_frustum();
        let crossing = Aabb::new(Vec3::new(-1.0, -1.0, -120.0), Vec3::new(1.0, 1.0, -80.0));
        assert_eq!(frustum.test_aabb(&crossing), Intersection::Intersects);
    }

    #[test]
    fn test_mask_narrows_to_straddled_planes() {
        let frustum = camera_frustum();
        // Crosses only the far plane (index 5)
        let crossing = Aabb::new(Vec3::new(-1.0, -1.0, -120.0), Vec3::new(1.0, 1.0, -80.0));
        let (result, mask) = frustum.test_aabb_masked(&crossing, ALL_PLANES);
        assert_eq!(result, Intersection::Intersects);
        assert_eq!(mask, 1 << 5);

        // A box beside the frustum is not rejected by planes already cleared
        let left = Aabb::new(Vec3::new(-1000.0, -1.0, -10.0), Vec3::new(-999.0, 1.0, -5.0));
        assert_eq!(frustum.test_aabb_masked(&left, mask).0, Intersection::Inside);
        assert_eq!(frustum.test_aabb_masked(&left, 0b1).0, Intersection::Outside);
    }

    #[test]
    fn test_accept_all_and_degenerate() {
        let huge = Aabb::new(Vec3::repeat(-1e6), Vec3::repeat(1e6));

        assert_eq!(Frustum::accept_all().test_aabb(&huge), Intersection::Inside);
        assert_eq!(Frustum::from_matrix(&Mat4::zeros()).test_aabb(&huge), Intersection::Outside);
    }
}
