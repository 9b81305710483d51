//! Opening and configuring the cache database.
//!
//! Storage is a single SQLite file shared by every generation. Opening
//! applies the WAL and durability pragmas and brings the schema up to date
//! before handing out the connection.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Handle to the cache database.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Clones share the underlying connection, so the
/// worker and the gateway handlers all serialize through it.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open the cache database at the given path, creating the file and
    /// schema as needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        configure(&conn).await?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// Same pragma configuration and schema as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        configure(&conn).await?;
        Ok(Self { conn })
    }
}

async fn configure(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA foreign_keys=ON;",
        )?;
        Ok(())
    })
    .await
    .map_err(Error::Database)?;

    migrations::run(conn).await
}
