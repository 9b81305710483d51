//! Install: prime the current generation from the manifest.

use futures::future::join_all;
use tracing::{debug, info, warn};

use layover_client::resolve_entry;
use layover_core::{Manifest, key};

use super::CacheWorker;

/// What install did: how many entries were primed, how many skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub stored: usize,
    pub skipped: usize,
}

impl CacheWorker {
    /// Prime the current generation with every manifest entry.
    ///
    /// Entries are fetched concurrently and settle independently: a failed
    /// entry is logged and skipped without aborting the others, and only
    /// 2xx responses are stored. Install never fails as a whole; a partial
    /// cache plus the runtime strategies still serves.
    pub async fn install(&self, manifest: &Manifest) -> InstallReport {
        let results = join_all(manifest.entries().iter().map(|entry| self.install_entry(entry))).await;

        let stored = results.into_iter().filter(|stored| *stored).count();
        let report = InstallReport { stored, skipped: manifest.len() - stored };

        info!(
            generation = %self.generation,
            stored = report.stored,
            skipped = report.skipped,
            "install finished"
        );

        report
    }

    async fn install_entry(&self, entry: &str) -> bool {
        let url = match resolve_entry(&self.origin, entry) {
            Ok(url) => url,
            Err(e) => {
                warn!(entry, error = %e, "skipping unresolvable manifest entry");
                return false;
            }
        };

        let response = match self.upstream.fetch(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "skipping manifest entry, fetch failed");
                return false;
            }
        };

        if !response.status.is_success() {
            warn!(url = %url, status = response.status.as_u16(), "skipping manifest entry, bad status");
            return false;
        }

        let stored = self.store(&key::exact(&url), &response).await;
        if stored {
            debug!(url = %url, "primed");
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use layover_core::Manifest;

    use super::super::testkit::{ScriptedFetch, worker_with};
    use super::*;

    fn site_manifest() -> Manifest {
        Manifest::new(vec![
            "./index.html".to_string(),
            "./theme.css".to_string(),
            "./images/map.png".to_string(),
        ])
    }

    #[tokio::test]
    async fn test_install_primes_manifest() {
        let upstream = Arc::new(
            ScriptedFetch::offline()
                .respond("https://site.test/index.html", 200, b"home")
                .respond("https://site.test/theme.css", 200, b"body{}")
                .respond("https://site.test/images/map.png", 200, b"png"),
        );
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/").await;

        let report = worker.install(&site_manifest()).await;

        assert_eq!(report, InstallReport { stored: 3, skipped: 0 });
        assert_eq!(db.list_keys("trip-v1").await.unwrap(), vec![
            "https://site.test/images/map.png".to_string(),
            "https://site.test/index.html".to_string(),
            "https://site.test/theme.css".to_string(),
        ]);
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let upstream = Arc::new(
            ScriptedFetch::offline()
                .respond("https://site.test/index.html", 200, b"home")
                .respond("https://site.test/theme.css", 200, b"body{}")
                .respond("https://site.test/images/map.png", 200, b"png"),
        );
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/").await;

        let first = worker.install(&site_manifest()).await;
        let keys_after_first = db.list_keys("trip-v1").await.unwrap();

        let second = worker.install(&site_manifest()).await;
        let keys_after_second = db.list_keys("trip-v1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(keys_after_first, keys_after_second);
        assert_eq!(db.count_records("trip-v1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_skips_failed_entries() {
        let upstream = Arc::new(
            ScriptedFetch::offline()
                .respond("https://site.test/index.html", 200, b"home")
                .fail("https://site.test/theme.css")
                .respond("https://site.test/images/map.png", 200, b"png"),
        );
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/").await;

        let report = worker.install(&site_manifest()).await;

        assert_eq!(report, InstallReport { stored: 2, skipped: 1 });
        assert!(db.get_record("trip-v1", "https://site.test/index.html").await.unwrap().is_some());
        assert!(db.get_record("trip-v1", "https://site.test/theme.css").await.unwrap().is_none());
        assert!(
            db.get_record("trip-v1", "https://site.test/images/map.png")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_install_skips_non_2xx() {
        let upstream = Arc::new(
            ScriptedFetch::offline()
                .respond("https://site.test/index.html", 200, b"home")
                .respond("https://site.test/theme.css", 404, b"gone")
                .respond("https://site.test/images/map.png", 500, b"boom"),
        );
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/").await;

        let report = worker.install(&site_manifest()).await;

        assert_eq!(report, InstallReport { stored: 1, skipped: 2 });
        assert_eq!(db.count_records("trip-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_install_empty_manifest() {
        let upstream = Arc::new(ScriptedFetch::offline());
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/").await;

        let report = worker.install(&Manifest::default()).await;

        assert_eq!(report, InstallReport::default());
        assert_eq!(upstream.calls(), 0);
        assert_eq!(db.count_records("trip-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_resolves_nested_origin() {
        let upstream = Arc::new(
            ScriptedFetch::offline().respond("https://site.test/trips/jeju/theme.css", 200, b"body{}"),
        );
        let (worker, db) = worker_with(upstream.clone(), "trip-v1", "https://site.test/trips/jeju/").await;

        let report = worker.install(&Manifest::new(vec!["./theme.css".to_string()])).await;

        assert_eq!(report.stored, 1);
        let record = db
            .get_record("trip-v1", "https://site.test/trips/jeju/theme.css")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.body, Bytes::from_static(b"body{}"));
    }
}
