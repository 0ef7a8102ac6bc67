//! Snapshot repository backed by `SQLite`.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, warn};

use super::model::InventorySnapshot;
use crate::Result;

/// Repository for per-identity inventory snapshots.
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS inventory_snapshots (
                identity TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Saves a snapshot, replacing any previous one for the identity.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub async fn save(&self, identity: &str, snapshot: &InventorySnapshot) -> Result<()> {
        let key = identity.to_lowercase();
        let payload = snapshot.encode()?;

        sqlx::query(
            r"
            INSERT INTO inventory_snapshots (identity, payload, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(&key)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            identity = %key,
            records = snapshot.records.len(),
            "Saved inventory snapshot"
        );
        Ok(())
    }

    /// Loads the snapshot for an identity.
    ///
    /// Returns `None` when nothing is stored or the stored payload cannot
    /// be decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load(&self, identity: &str) -> Result<Option<InventorySnapshot>> {
        let key = identity.to_lowercase();

        let row = sqlx::query(
            r"
            SELECT payload FROM inventory_snapshots
            WHERE identity = ?
            ",
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(identity = %key, "No stored snapshot");
            return Ok(None);
        };

        let payload: String = row.get("payload");
        match InventorySnapshot::decode(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(identity = %key, error = %e, "Ignoring undecodable snapshot");
                Ok(None)
            }
        }
    }

    /// Deletes the snapshot for an identity.
    ///
    /// Returns `true` if a snapshot existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, identity: &str) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM inventory_snapshots
            WHERE identity = ?
            ",
        )
        .bind(identity.to_lowercase())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
