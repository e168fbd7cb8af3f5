//! HTTP surface: JSON conversation API and SSE turn streaming

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{build_router, serve};
pub use state::AppState;
