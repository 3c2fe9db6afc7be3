//! Upstream client for portico.
//!
//! This crate provides the HTTP client used to reach the origin server the
//! gateway fronts, behind the [`Origin`] trait so caching strategies can be
//! exercised without a network.

pub mod origin;

pub use origin::{HttpOrigin, Origin, OriginConfig, OriginRequest, OriginResponse};
