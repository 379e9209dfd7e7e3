//! Data models
//!
//! Shared between shop-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps Unix millis.

pub mod category;
pub mod order;
pub mod page;
pub mod payment;
pub mod product;
pub mod role;
pub mod setting;
pub mod user;
pub mod voucher;

// Re-exports
pub use category::*;
pub use order::*;
pub use page::*;
pub use payment::*;
pub use product::*;
pub use role::*;
pub use setting::*;
pub use user::*;
pub use voucher::*;
