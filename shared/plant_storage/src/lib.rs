//! Record storage for the plant sharing service
//!
//! This crate owns the `DynamoDB` tables behind the Plant API: plant records and the
//! read-only user directory (users with their postal address) joined into the public feed.
//! In-memory implementations of both stores are available behind the `test-utils` feature.

pub mod plant;
pub mod user;
