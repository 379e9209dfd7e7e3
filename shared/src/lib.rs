//! Shared types for the shop
//!
//! Domain models, unified error codes and small utilities used by the
//! server and by API clients.

pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use pagination::{PageParams, PaginatedResponse};
