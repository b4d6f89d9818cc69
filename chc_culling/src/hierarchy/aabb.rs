/// Axis-aligned bounding box used by the hierarchy and the query proxies.

use std::ops::{Add, AddAssign};
use glam::Vec3;

/// Axis-aligned bounding box.
///
/// When not reset, `min <= max` componentwise. The reset state
/// (`min = +inf`, `max = -inf`) is the identity for [`union`](Self::union).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AxisAlignedBox {
    /// Create a box from its two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "box min {} exceeds max {}", min, max);
        Self { min, max }
    }

    /// The reset box (identity for union).
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Box anchored at `origin` and extending by `size` along each axis.
    pub fn from_origin_size(origin: Vec3, size: Vec3) -> Self {
        Self::new(origin, origin + size)
    }

    /// Reset to the empty state.
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// True for the reset state (or any inverted box).
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Componentwise union: min of mins, max of maxes.
    pub fn union(&self, other: &AxisAlignedBox) -> AxisAlignedBox {
        AxisAlignedBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Test if this box fully contains another box.
    pub fn contains(&self, other: &AxisAlignedBox) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Squared distance from `point` to the closest point of the box.
    ///
    /// Zero when the point is inside.
    pub fn squared_distance_to(&self, point: Vec3) -> f32 {
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    /// The eight corners.
    ///
    /// Corner `i` takes `max` on axis k when bit k of `i` is set
    /// (bit0 = X, bit1 = Y, bit2 = Z).
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }
}

impl Default for AxisAlignedBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for AxisAlignedBox {
    type Output = AxisAlignedBox;

    fn add(self, other: AxisAlignedBox) -> AxisAlignedBox {
        self.union(&other)
    }
}

impl AddAssign for AxisAlignedBox {
    fn add_assign(&mut self, other: AxisAlignedBox) {
        *self = self.union(&other);
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
