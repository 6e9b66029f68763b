//! Authentication module for the birthday greeter
//!
//! Password hashing, JWT issue/validation, signin rate limiting and the
//! request extractor that guards protected endpoints.

pub mod extractor;
pub mod handlers;
pub mod password;
mod rate_limit;
mod service;

pub use extractor::AuthorizedUser;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use service::{AuthService, Claims};
