//! Octree configuration

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::geometry::Aabb;

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Root volume; objects outside it are kept at the root
    pub world_bounds: Aabb,

    /// Maximum subdivision depth (root is depth 0)
    pub max_depth: u32,

    /// Objects a leaf holds before it subdivides
    pub split_threshold: usize,

    /// Minimum child half size (prevents excessive subdivision)
    pub min_half_size: f32,

    /// Empty nodes at or above this depth are never pruned
    pub min_retained_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            world_bounds: Aabb::cube(Vec3::zeros(), 1000.0),
            max_depth: 8,
            split_threshold: 8,
            min_half_size: 1.0,
            min_retained_depth: 0,
        }
    }
}

impl Config for OctreeConfig {}

impl OctreeConfig {
    /// Config with the given root volume and default tuning
    pub fn with_bounds(world_bounds: Aabb) -> Self {
        Self {
            world_bounds,
            ..Default::default()
        }
    }

    /// Check that every value can be used as-is
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.world_bounds.size();
        if !self.world_bounds.is_valid() || !size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world bounds must be finite with positive size, got {:?}",
                self.world_bounds
            )));
        }
        if self.split_threshold == 0 {
            return Err(ConfigError::Invalid("split_threshold must be at least 1".into()));
        }
        if !(self.min_half_size.is_finite() && self.min_half_size >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_half_size must be finite and non-negative, got {}",
                self.min_half_size
            )));
        }
        if self.min_retained_depth > self.max_depth {
            return Err(ConfigError::Invalid(format!(
                "min_retained_depth {} exceeds max_depth {}",
                self.min_retained_depth, self.max_depth
            )));
        }
        Ok(())
    }

    /// Replace unusable values with defaults, logging each fix
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let size = self.world_bounds.size();
        if !self.world_bounds.is_valid() || !size.iter().all(|s| s.is_finite() && *s > 0.0) {
            log::warn!(
                "Invalid octree bounds {:?}, using {:?}",
                self.world_bounds,
                defaults.world_bounds
            );
            self.world_bounds = defaults.world_bounds;
        }
        if self.split_threshold == 0 {
            log::warn!("Octree split_threshold of 0 raised to 1");
            self.split_threshold = 1;
        }
        if !(self.min_half_size.is_finite() && self.min_half_size >= 0.0) {
            log::warn!(
                "Invalid octree min_half_size {}, using {}",
                self.min_half_size,
                defaults.min_half_size
            );
            self.min_half_size = defaults.min_half_size;
        }
        if self.min_retained_depth > self.max_depth {
            log::warn!(
                "Octree min_retained_depth {} clamped to max_depth {}",
                self.min_retained_depth,
                self.max_depth
            );
            self.min_retained_depth = self.max_depth;
        }
        self
    }
}
