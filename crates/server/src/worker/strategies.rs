//! The two fetch strategies.
//!
//! Versioned assets (`.css`/`.js` paths) go network first so style and
//! script changes land the moment they deploy; their offline fallback tries
//! the exact key, then the query-stripped key, which bridges `?v=` bumps
//! against an older stored copy. Everything else is cache first.

use http::StatusCode;
use tracing::{debug, warn};
use url::Url;

use layover_client::FetchResponse;
use layover_core::{CacheRecord, key, strategy};

use super::{CacheWorker, FetchOutcome, ServedResponse, record_headers};

impl CacheWorker {
    /// Cache-first: serve the stored copy when one exists; otherwise fetch,
    /// store a qualifying copy, and serve the network response.
    pub(super) async fn cache_first(&self, url: &Url) -> FetchOutcome {
        let exact = key::exact(url);

        if let Some(record) = self.lookup(&exact).await {
            debug!(url = %url, "cache hit");
            return FetchOutcome::Response(ServedResponse::from_record(record));
        }

        match self.upstream.fetch(url).await {
            Ok(response) => {
                if response.status == StatusCode::OK
                    && strategy::should_store(&self.origin, url, &response.final_url, &response.headers)
                {
                    self.store(&exact, &response).await;
                }
                FetchOutcome::Response(ServedResponse::from_network(&response))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "cache miss and network failed");
                FetchOutcome::Unavailable
            }
        }
    }

    /// Network-first: always try the network and refresh the stored copy on
    /// HTTP 200. Only on network failure fall back to cache, exact key then
    /// query-stripped key, in that order.
    pub(super) async fn network_first(&self, url: &Url) -> FetchOutcome {
        match self.upstream.fetch(url).await {
            Ok(response) => {
                if response.status == StatusCode::OK {
                    self.store(&key::exact(url), &response).await;
                }
                FetchOutcome::Response(ServedResponse::from_network(&response))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "network failed, trying cache fallback");

                let exact = key::exact(url);
                if let Some(record) = self.lookup(&exact).await {
                    return FetchOutcome::Response(ServedResponse::from_record(record));
                }

                let stripped = key::without_query(url);
                if stripped != exact
                    && let Some(record) = self.lookup(&stripped).await
                {
                    debug!(url = %url, key = %stripped, "served via query-stripped fallback");
                    return FetchOutcome::Response(ServedResponse::from_record(record));
                }

                FetchOutcome::Unavailable
            }
        }
    }

    /// Cache lookup that treats storage errors as misses.
    async fn lookup(&self, key: &str) -> Option<CacheRecord> {
        match self.db.get_record(self.generation.name(), key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store a response under the given key, logging instead of failing.
    pub(super) async fn store(&self, key: &str, response: &FetchResponse) -> bool {
        let record = CacheRecord::new(
            key,
            response.status.as_u16(),
            record_headers(&response.headers),
            response.bytes.clone(),
        );
        match self.db.upsert_record(self.generation.name(), &record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to store response");
                false
            }
        }
    }
}
