//! The cache worker: a versioned offline cache between clients and the site.
//!
//! The worker's lifecycle has three phases. Install primes the current
//! generation from the manifest. Activation evicts every other generation.
//! From then on each intercepted request is resolved cache-first or
//! network-first depending on its URL, storing copies as it goes.

pub mod events;
mod install;
mod strategies;

pub use install::InstallReport;

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use layover_client::{Fetch, FetchResponse};
use layover_core::{CacheDb, CacheRecord, Error, Generation, Strategy, strategy};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Network,
}

impl ServeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ServeSource::Cache => "cache",
            ServeSource::Network => "network",
        }
    }
}

/// A response ready to replay to the client.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ServeSource,
}

impl ServedResponse {
    fn from_record(record: CacheRecord) -> Self {
        Self {
            status: StatusCode::from_u16(record.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: replay_headers(&record.headers),
            body: record.body,
            source: ServeSource::Cache,
        }
    }

    fn from_network(response: &FetchResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.bytes.clone(),
            source: ServeSource::Network,
        }
    }
}

/// Outcome of one intercepted request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A response to replay, from cache or network.
    Response(ServedResponse),
    /// Network failed and no cached fallback matched.
    Unavailable,
}

/// What activation evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub evicted: Vec<String>,
}

/// Storage summary reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub generation: String,
    pub stem: String,
    pub version: u32,
    pub records: u64,
    pub generations: Vec<String>,
}

/// Worker state shared by all event handlers.
#[derive(Clone)]
pub struct CacheWorker {
    db: CacheDb,
    upstream: Arc<dyn Fetch>,
    generation: Generation,
    origin: Url,
}

impl CacheWorker {
    pub fn new(db: CacheDb, upstream: Arc<dyn Fetch>, generation: Generation, origin: Url) -> Self {
        Self { db, upstream, generation, origin }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve one intercepted request.
    pub async fn handle_fetch(&self, url: &Url) -> FetchOutcome {
        match strategy::classify(url) {
            Strategy::NetworkFirst => self.network_first(url).await,
            Strategy::CacheFirst => self.cache_first(url).await,
        }
    }

    /// Evict every generation except the current one.
    ///
    /// This is the only path that deletes cached data. Failures are logged
    /// and skipped; a stale leftover generation costs disk, not correctness.
    pub async fn activate(&self) -> ActivateReport {
        let names = match self.db.list_generations().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "could not enumerate generations, skipping eviction");
                return ActivateReport::default();
            }
        };

        let mut evicted = Vec::new();
        for name in names {
            if name == self.generation.name() {
                continue;
            }
            match self.db.delete_generation(&name).await {
                Ok(count) => {
                    info!(generation = %name, records = count, "evicted generation");
                    evicted.push(name);
                }
                Err(e) => warn!(generation = %name, error = %e, "failed to evict generation"),
            }
        }

        ActivateReport { evicted }
    }

    /// Storage summary for the status endpoint.
    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let records = self.db.count_records(self.generation.name()).await?;
        let generations = self.db.list_generations().await?;
        Ok(WorkerStatus {
            generation: self.generation.name().to_string(),
            stem: self.generation.stem().to_string(),
            version: self.generation.version(),
            records,
            generations,
        })
    }
}

/// Capture response headers as storable pairs. Values that are not valid
/// UTF-8 are dropped.
fn record_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// Rebuild a header map from stored pairs, skipping anything that no longer
/// parses.
fn replay_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            headers.append(name, value);
        }
    }
    headers
}
