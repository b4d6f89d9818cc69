/// Frustum: view volume test for bounding boxes.
///
/// Works in clip space: the eight box corners are transformed by the
/// view-projection matrix and compared against `w`. Depth follows the
/// `[0, 1]` convention of `Mat4::perspective_rh`.

use glam::{Mat4, Vec3};
use crate::hierarchy::AxisAlignedBox;

/// View volume of a camera, kept as its view-projection matrix.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    view_projection: Mat4,
}

impl Frustum {
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        Self { view_projection: *view_projection }
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Test if a box (potentially) intersects this frustum.
    ///
    /// May return false positives, see [`frustum_intersects`].
    pub fn intersects_box(&self, bounds: &AxisAlignedBox) -> bool {
        frustum_intersects(bounds.min, bounds.max, &self.view_projection)
    }
}

/// Clip-space box/frustum test.
///
/// True as soon as one corner lies inside the clip volume
/// (`|x| <= w`, `|y| <= w`, `0 <= z <= w`). Otherwise the box can still
/// cover the frustum without any corner inside: it is accepted when its
/// corners straddle both X planes while not all lying beyond one Y plane
/// (or the same with X and Y swapped), and the box is not entirely outside
/// in depth (all corners within depth, or some but not all in front of
/// the near plane).
pub fn frustum_intersects(min: Vec3, max: Vec3, view_projection: &Mat4) -> bool {
    let (mut pos_x, mut neg_x, mut pos_y, mut neg_y, mut neg_z) = (0u32, 0u32, 0u32, 0u32, 0u32);
    let mut all_in_z = true;

    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
        let clip = *view_projection * corner.extend(1.0);

        pos_x += (clip.x > clip.w) as u32;
        neg_x += (clip.x < -clip.w) as u32;
        pos_y += (clip.y > clip.w) as u32;
        neg_y += (clip.y < -clip.w) as u32;
        neg_z += (clip.z < 0.0) as u32;

        let in_z = clip.z >= 0.0 && clip.z <= clip.w;
        all_in_z &= in_z;

        if in_z && clip.x.abs() <= clip.w && clip.y.abs() <= clip.w {
            return true;
        }
    }

    let depth_overlaps = all_in_z || (neg_z != 0 && neg_z != 8);
    let straddles_x = pos_x > 0 && neg_x > 0 && pos_y != 8 && neg_y != 8;
    let straddles_y = pos_y > 0 && neg_y > 0 && pos_x != 8 && neg_x != 8;

    depth_overlaps && (straddles_x || straddles_y)
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
