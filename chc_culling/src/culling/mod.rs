//! Culling strategies and the CHC++ visibility scheduler.

mod culler;
mod frame_stats;
mod scheduler;

pub use culler::{
    create_culler, BruteForceCuller, ChcCuller, CullingMode, FrustumCuller, InstanceCuller,
    OcclusionCuller,
};
pub use frame_stats::FrameStats;
pub use scheduler::{SchedulerConfig, VisibilityScheduler};
