//! Shop Server - storefront and admin backend
//!
//! # Modules
//!
//! ```text
//! shop-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT, permissions, rate limiting
//! ├── db/            # SQLite pool + repositories
//! ├── catalog/       # category tree, products
//! ├── vouchers/      # voucher validation + discounts
//! ├── checkout/      # quotes, orders, cancellation
//! ├── payments/      # VietQR, PayPal, EVM
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation, slugs, money
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod core;
pub mod db;
pub mod payments;
pub mod utils;
pub mod vouchers;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Security event logging, emitted under the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
