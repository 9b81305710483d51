//! SQLite-backed storage for versioned response caches.
//!
//! This module provides a persistent cache of HTTP responses using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named cache generations, evicted as whole buckets
//! - Records keyed by exact request URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod migrations;
pub mod records;

pub use connection::CacheDb;
pub use records::CacheRecord;
