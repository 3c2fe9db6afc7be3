//! SQLite-backed cache bucket storage.
//!
//! One database holds every bucket; a bucket is a named, versioned
//! partition of the `entries` table. Entries are keyed by a SHA-256 of
//! method plus URL and enumerated in insertion order, which is what the
//! photo trim leans on. Precache commits multiple entries in one
//! transaction, and the file is opened in WAL mode so reads keep
//! serving while revalidations write.
//!
//! The storage layer is policy-free: which responses are cacheable is
//! decided by the strategies, not here.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
