//! Utilities: logging, input validation, slugs and money arithmetic

pub mod logger;
pub mod money;
pub mod slug;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
