//! service-core: Shared infrastructure for the document classifier frontend.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
