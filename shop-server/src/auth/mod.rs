//! Authentication & authorization
//!
//! - [`JwtService`] issues and validates access tokens
//! - [`require_auth`] / [`require_permission`] guard routes
//! - [`CurrentUser`] is available as an extractor in handlers
//! - [`RateLimiter`] throttles login and registration per IP

mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod rate_limit;

pub use jwt::{CUSTOMER_ROLE, Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_permission};
pub use password::{hash_password, verify_password};
pub use rate_limit::{RateLimiter, login_rate_limit, register_rate_limit};
