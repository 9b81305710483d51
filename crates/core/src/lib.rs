//! Core types and shared functionality for layover.
//!
//! This crate provides:
//! - Versioned response-cache storage with a SQLite backend
//! - Cache generations, manifests, and request keys
//! - Fetch strategy classification
//! - Configuration structures and unified error types

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod key;
pub mod manifest;
pub mod strategy;

pub use cache::{CacheDb, CacheRecord};
pub use config::AppConfig;
pub use error::Error;
pub use generation::Generation;
pub use manifest::Manifest;
pub use strategy::Strategy;
