/*!
# CHC Culling

Hierarchical occlusion culling for large grids of instanced meshes.

A bounding-volume hierarchy is built once over the instance grid; every
frame a CHC++ (Coherent Hierarchical Culling) scheduler walks it front to
back and decides which instances to draw, using hardware occlusion queries
and the previous frame's visibility to hide query latency.

## Architecture

- **HierarchyBuilder / Hierarchy**: bottom-up BVH over the instance grid
- **VisibilityScheduler**: per-frame CHC++ traversal
- **InstanceCuller**: strategy trait (brute force, frustum, occlusion, CHC++)
- **QueryService**: the GPU collaborator, implemented by backends
- **SoftwareQueryService**: headless backend with a CPU depth buffer

Backends implement `QueryService`; the culling code never touches a
graphics API directly.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod culling;
pub mod hierarchy;
pub mod query;

// Main chc namespace module
pub mod chc {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod culling {
        pub use crate::culling::*;
    }

    pub mod hierarchy {
        pub use crate::hierarchy::*;
    }

    pub mod query {
        pub use crate::query::*;
    }
}

// Re-export math library at crate root
pub use glam;
