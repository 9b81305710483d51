//! Record CRUD operations.
//!
//! Provides functions for storing, replaying, and evicting cached responses,
//! keyed by (generation, url). Eviction works at whole-generation
//! granularity; individual records are only ever overwritten, never deleted.

use super::connection::CacheDb;
use crate::Error;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response record.
///
/// Holds everything needed to replay a response to a client: status,
/// headers as (name, value) pairs, and the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl CacheRecord {
    /// Build a record from response parts, stamping the storage time.
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Insert or update a record in the given generation.
    ///
    /// Uses UPSERT semantics: inserts if the (generation, url) key doesn't
    /// exist, replaces the stored response if it does.
    pub async fn upsert_record(&self, generation: &str, record: &CacheRecord) -> Result<(), Error> {
        let generation = generation.to_string();
        let record = record.clone();
        let headers_json =
            serde_json::to_string(&record.headers).map_err(|e| Error::CorruptRecord(e.to_string()))?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (generation, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(generation, url) DO UPDATE SET
                         status = excluded.status,
                         headers_json = excluded.headers_json,
                         body = excluded.body,
                         stored_at = excluded.stored_at",
                    params![
                        &generation,
                        &record.url,
                        record.status as i64,
                        &headers_json,
                        record.body.to_vec(),
                        &record.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by its exact key within a generation.
    ///
    /// Returns None if the key doesn't exist in that generation.
    pub async fn get_record(&self, generation: &str, url: &str) -> Result<Option<CacheRecord>, Error> {
        let generation = generation.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let result = conn.query_row(
                    "SELECT url, status, headers_json, body, stored_at
                     FROM records WHERE generation = ?1 AND url = ?2",
                    params![generation, url],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Vec<u8>>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                );

                match result {
                    Ok((url, status, headers_json, body, stored_at)) => {
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptRecord(format!("{url}: {e}")))?;
                        Ok(Some(CacheRecord {
                            url,
                            status: status as u16,
                            headers,
                            body: body.into(),
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List every generation that currently holds at least one record,
    /// sorted by name.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT generation FROM records ORDER BY generation")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every record in a generation.
    ///
    /// Returns the number of deleted records. Deleting a generation that
    /// doesn't exist is a no-op.
    pub async fn delete_generation(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM records WHERE generation = ?1", params![generation])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count the records stored in a generation.
    pub async fn count_records(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM records WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// List the keys stored in a generation, sorted.
    pub async fn list_keys(&self, generation: &str) -> Result<Vec<String>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM records WHERE generation = ?1 ORDER BY url")?;
                let keys = stmt
                    .query_map(params![generation], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_record(url: &str, body: &[u8]) -> CacheRecord {
        CacheRecord::new(
            url,
            200,
            vec![("content-type".to_string(), "text/html".to_string())],
            Bytes::copy_from_slice(body),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let record = make_test_record("https://site.test/day2.html", b"<html>day 2</html>");

        db.upsert_record("trip-v3", &record).await.unwrap();

        let retrieved = db.get_record("trip-v3", &record.url).await.unwrap().unwrap();
        assert_eq!(retrieved.url, record.url);
        assert_eq!(retrieved.status, 200);
        assert_eq!(retrieved.headers, record.headers);
        assert_eq!(retrieved.body, record.body);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_record("trip-v3", "https://site.test/nope").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://site.test/theme.css";

        db.upsert_record("trip-v3", &make_test_record(url, b"old")).await.unwrap();
        db.upsert_record("trip-v3", &make_test_record(url, b"new")).await.unwrap();

        let retrieved = db.get_record("trip-v3", url).await.unwrap().unwrap();
        assert_eq!(retrieved.body, Bytes::from_static(b"new"));
        assert_eq!(db.count_records("trip-v3").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://site.test/index.html";

        db.upsert_record("trip-v2", &make_test_record(url, b"v2")).await.unwrap();
        db.upsert_record("trip-v3", &make_test_record(url, b"v3")).await.unwrap();

        let v2 = db.get_record("trip-v2", url).await.unwrap().unwrap();
        let v3 = db.get_record("trip-v3", url).await.unwrap().unwrap();
        assert_eq!(v2.body, Bytes::from_static(b"v2"));
        assert_eq!(v3.body, Bytes::from_static(b"v3"));
    }

    #[tokio::test]
    async fn test_list_generations() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_record("trip-v2", &make_test_record("https://site.test/a", b"a"))
            .await
            .unwrap();
        db.upsert_record("trip-v3", &make_test_record("https://site.test/a", b"a"))
            .await
            .unwrap();
        db.upsert_record("trip-v3", &make_test_record("https://site.test/b", b"b"))
            .await
            .unwrap();

        let generations = db.list_generations().await.unwrap();
        assert_eq!(generations, vec!["trip-v2".to_string(), "trip-v3".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_record("trip-v2", &make_test_record("https://site.test/a", b"a"))
            .await
            .unwrap();
        db.upsert_record("trip-v2", &make_test_record("https://site.test/b", b"b"))
            .await
            .unwrap();
        db.upsert_record("trip-v3", &make_test_record("https://site.test/a", b"a"))
            .await
            .unwrap();

        let deleted = db.delete_generation("trip-v2").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.count_records("trip-v2").await.unwrap(), 0);
        assert_eq!(db.count_records("trip-v3").await.unwrap(), 1);

        let again = db.delete_generation("trip-v2").await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_list_keys() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_record("trip-v3", &make_test_record("https://site.test/b.png", b"b"))
            .await
            .unwrap();
        db.upsert_record("trip-v3", &make_test_record("https://site.test/a.css", b"a"))
            .await
            .unwrap();

        let keys = db.list_keys("trip-v3").await.unwrap();
        assert_eq!(keys, vec![
            "https://site.test/a.css".to_string(),
            "https://site.test/b.png".to_string(),
        ]);
    }
}
