//! Snapshot data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::inventory::DomainRecord;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted state of one identity's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    /// Format version.
    pub version: u32,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Domain records in creation order.
    pub records: Vec<DomainRecord>,
}

/// Loose shape used for decoding; every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

impl InventorySnapshot {
    /// Takes a snapshot of the given records.
    #[must_use]
    pub fn new(records: Vec<DomainRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            records,
        }
    }

    /// Serializes the snapshot for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a stored snapshot.
    ///
    /// Records that do not have the expected shape are skipped; the rest
    /// are normalized when restored into an aggregator.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object.
    pub fn decode(payload: &str) -> serde_json::Result<Self> {
        let stored: StoredSnapshot = serde_json::from_str(payload)?;

        let mut records = Vec::with_capacity(stored.records.len());
        for (position, value) in stored.records.into_iter().enumerate() {
            match serde_json::from_value::<DomainRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => warn!(position, error = %e, "Skipping malformed stored record"),
            }
        }

        Ok(Self {
            version: stored.version.unwrap_or(SNAPSHOT_VERSION),
            saved_at: stored.saved_at.unwrap_or_else(Utc::now),
            records,
        })
    }
}
