//! Bounding volumes and intersection primitives
//!
//! Every shape classifies an axis-aligned box with the tri-state
//! [`Intersection`], which is what lets the octree accept or reject whole
//! subtrees at once.

mod aabb;
mod frustum;
mod intersection;
mod ray;
mod sphere;
mod triangle;

pub use aabb::Aabb;
pub use frustum::{Frustum, Plane, PlaneMask, ALL_PLANES};
pub use intersection::Intersection;
pub use ray::Ray;
pub use sphere::Sphere;
pub use triangle::Triangle;
