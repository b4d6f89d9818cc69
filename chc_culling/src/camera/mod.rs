//! Camera module: camera, frustum test, and scripted camera paths.
//!
//! Cameras are passive data containers owned and driven by the caller.

mod camera;
mod camera_path;
mod frustum;

pub use camera::Camera;
pub use camera_path::{CameraPath, PATH_FAR, PATH_FOV_Y, PATH_NEAR};
pub use frustum::{frustum_intersects, Frustum};
