//! The portico gateway: an HTTP front for one origin server that applies
//! per-path caching strategies and keeps serving a useful subset of the
//! site when the origin is unreachable.

pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod lifecycle;

pub use dispatch::Dispatcher;
pub use gateway::Gateway;
pub use lifecycle::{Lifecycle, LifecycleState};
