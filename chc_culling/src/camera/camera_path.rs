/// CameraPath: quadratic uniform B-spline for scripted fly-throughs.

use glam::Vec3;
use crate::error::Result;
use super::camera::Camera;

const SOURCE: &str = "chc::CameraPath";

/// Vertical field of view of path cameras (45°)
pub const PATH_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
pub const PATH_NEAR: f32 = 0.01;
pub const PATH_FAR: f32 = 100.0;

const INV_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Control polygon of the default fly-through, in unit space.
///
/// X and Z are scaled by the grid resolution and Y by the mesh height. Two
/// orbits around the grid at twice its extent, then a dive into the grid.
const FLYTHROUGH: [[f32; 3]; 22] = [
    [0.0, 1.0, 4.0],
    [0.0, 1.0, 2.0],
    [2.0 * INV_SQRT_2, 1.0, 2.0 * INV_SQRT_2],
    [2.0, 1.0, 0.0],
    [2.0 * INV_SQRT_2, 1.0, -2.0 * INV_SQRT_2],
    [0.0, 1.0, -2.0],
    [-2.0 * INV_SQRT_2, 1.0, -2.0 * INV_SQRT_2],
    [-2.0, 1.0, 0.0],
    [-2.0 * INV_SQRT_2, 1.0, 2.0 * INV_SQRT_2],
    [0.0, 1.0, 2.0],
    [2.0 * INV_SQRT_2, 1.0, 2.0 * INV_SQRT_2],
    [2.0, 1.0, 0.0],
    [2.0 * INV_SQRT_2, 1.0, -2.0 * INV_SQRT_2],
    [0.0, 1.0, -2.0],
    [-2.0 * INV_SQRT_2, 1.0, -2.0 * INV_SQRT_2],
    [-2.0, 1.0, 0.0],
    [0.5, 1.0, 1.0],
    [0.5, 0.5, 0.5],
    [1.0, 0.5, 0.7],
    [0.85, 0.5, 0.76],
    [0.65, 0.5, 0.9],
    [0.5, 0.5, 0.6],
];

/// Quadratic uniform B-spline through a control polygon.
///
/// The curve starts halfway between the first two control points and ends
/// halfway between the last two; it touches none of them.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPath {
    control_points: Vec<Vec3>,
}

impl CameraPath {
    /// Path over `control_points`; needs at least three finite points.
    pub fn new(control_points: Vec<Vec3>) -> Result<Self> {
        if control_points.len() < 3 {
            crate::chc_bail!(SOURCE,
                "a quadratic B-spline needs at least 3 control points, got {}",
                control_points.len());
        }
        if let Some(bad) = control_points.iter().position(|p| !p.is_finite()) {
            crate::chc_bail!(SOURCE, "control point {} is not finite: {}", bad, control_points[bad]);
        }
        Ok(Self { control_points })
    }

    /// The default fly-through in unit space.
    pub fn flythrough() -> Self {
        Self {
            control_points: FLYTHROUGH.iter().map(|p| Vec3::from_array(*p)).collect(),
        }
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    /// Point at parameter `u`, clamped to `[0, 1]`.
    pub fn eval(&self, u: f32) -> Vec3 {
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let segments = self.control_points.len() - 2;

        let t = u * segments as f32;
        let index = (t.floor() as usize).min(segments - 1);
        let t = t - index as f32;

        // Uniform quadratic basis
        let weights = 0.5 * Vec3::new(t * t - 2.0 * t + 1.0, -2.0 * t * t + 2.0 * t + 1.0, t * t);
        let p = &self.control_points[index..index + 3];
        p[0] * weights.x + p[1] * weights.y + p[2] * weights.z
    }

    /// Camera at parameter `u` for a `grid_resolution²` grid of meshes of
    /// extent `mesh_size`, looking at the centre of the grid.
    pub fn camera_at(&self, u: f32, grid_resolution: u32, mesh_size: Vec3, aspect: f32) -> Camera {
        let resolution = grid_resolution as f32;
        let scale = Vec3::new(resolution, mesh_size.y, resolution);
        let centre = Vec3::new(resolution / 2.0, mesh_size.y / 2.0, resolution / 2.0);
        let eye = self.eval(u) * scale;

        Camera::look_at(eye, centre, PATH_FOV_Y, aspect, PATH_NEAR, PATH_FAR)
    }
}

impl Default for CameraPath {
    fn default() -> Self {
        Self::flythrough()
    }
}

#[cfg(test)]
#[path = "camera_path_tests.rs"]
mod tests;
