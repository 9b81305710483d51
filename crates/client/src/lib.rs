//! Client code for layover.
//!
//! This crate provides the network half of the cache worker: the upstream
//! HTTP fetch pipeline and the URL resolution shared by the server.

pub mod fetch;

pub use fetch::url::{UrlError, resolve_entry};

pub use fetch::{Fetch, FetchClient, FetchConfig, FetchResponse};
