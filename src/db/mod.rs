//! Database module for the birthday greeter
//!
//! Connection pooling, embedded migrations and the data access layer
//! for users and their birthday subscriptions.

pub mod models;
pub mod operations;

pub use models::{Profile, Subscription, User};
pub use operations::{DbOperations, DbPoolStatus, MIGRATOR};
