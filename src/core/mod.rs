//! # Core Utilities
//!
//! Low-level pieces shared by the pipeline: render surfaces with scoped
//! release and cooperative cancellation.

pub mod cancel;
pub mod surface_pool;

pub use cancel::CancelToken;
pub use surface_pool::{SurfaceError, SurfaceLease, SurfacePool};
