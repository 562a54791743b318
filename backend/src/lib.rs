//! Plants backend service
//!
//! Users upload plants with a photo, list their own plants and post them to a public feed
//! that anyone can browse.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// Access token issuing and verification
pub mod jwt;

/// Plant image storage
pub mod media_storage;

/// Request middleware
pub mod middleware;

/// HTTP routes
pub mod routes;

/// Server bootstrap
pub mod server;

/// Shared types: configuration, errors, extractors
pub mod types;
