//! Core types and shared functionality for portico.
//!
//! Home of the SQLite bucket store, the request classifier that picks a
//! strategy and bucket for each path, the error type shared across
//! crates, and the layered configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod route;

pub use cache::{CacheDb, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
pub use route::{Bucket, Route, Strategy, classify, valid_bucket_names};
