//! Fetch strategy classification.
//!
//! Every intercepted request is resolved by exactly one of two strategies,
//! decided purely from the request URL. Stylesheets and scripts carry a
//! cache-busting `?v=<timestamp>` query and must prefer fresh copies, so
//! they go network-first. Everything else (pages, images, fonts) is
//! cache-first for offline speed.

use http::HeaderMap;
use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use url::Url;

/// How an intercepted request is resolved against cache and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache, falling back to the network on a miss.
    CacheFirst,
    /// Go to the network, falling back to cache only on network failure.
    NetworkFirst,
}

/// Classify a request URL into its fetch strategy.
pub fn classify(url: &Url) -> Strategy {
    if is_versioned_asset(url) { Strategy::NetworkFirst } else { Strategy::CacheFirst }
}

/// Whether the URL names a versioned asset: a path ending in `.css` or
/// `.js`. The query string does not participate in the decision.
pub fn is_versioned_asset(url: &Url) -> bool {
    let path = url.path();
    path.ends_with(".css") || path.ends_with(".js")
}

/// Whether a runtime response fetched on a cache-first miss may be stored.
///
/// Mirrors what a same-origin site can legitimately hold on to: responses
/// that landed on the site's own origin, cross-origin responses that were
/// served with `Access-Control-Allow-Origin`, and image assets (any request
/// URL containing `/images/`) regardless of origin.
///
/// The status check (exactly 200) is a separate gate applied by the caller.
pub fn should_store(origin: &Url, request_url: &Url, final_url: &Url, headers: &HeaderMap) -> bool {
    if final_url.origin() == origin.origin() {
        return true;
    }

    if headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
        return true;
    }

    request_url.as_str().contains("/images/")
}
