//! Occlusion query plumbing.
//!
//! The culling strategies talk to the GPU only through [`QueryService`].
//! Query handles are drawn from a [`QueryPool`]. [`SoftwareQueryService`]
//! is a headless backend with a coarse CPU depth buffer.

mod query_pool;
mod query_service;
mod software_query_service;

#[cfg(test)]
pub(crate) mod mock_query_service;

pub use query_pool::QueryPool;
pub use query_service::{QueryHandle, QueryService};
pub use software_query_service::{
    SoftwareQueryService, SoftwareServiceConfig, SoftwareServiceStats, WriteMask,
};
