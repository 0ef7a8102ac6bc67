//! Per-identity persistence of the inventory.
//!
//! Snapshots are full-state overwrites keyed by the signed-in identity.
//! A missing or undecodable snapshot means "start empty".

mod model;
mod repository;

pub use model::{InventorySnapshot, SNAPSHOT_VERSION};
pub use repository::SnapshotRepository;
