//! Request keys for cache records.
//!
//! Records are keyed by the serialized request URL. Two forms exist: the
//! exact key keeps the query string, the stripped key drops it. Versioned
//! assets are stored under their exact key (`/theme.css?v=1700000000`), so
//! offline fallback after a version bump needs the stripped form as a second
//! lookup.

use url::{Position, Url};

/// The exact cache key for a URL: everything up to and including the query,
/// fragment excluded.
pub fn exact(url: &Url) -> String {
    url[..Position::AfterQuery].to_string()
}

/// The cache key with the query string stripped.
pub fn without_query(url: &Url) -> String {
    url[..Position::AfterPath].to_string()
}
