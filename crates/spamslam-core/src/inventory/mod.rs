//! The domain inventory: one record per sending domain.
//!
//! The [`Aggregator`] is the only writer of the counting fields
//! (`email_counts`, `message_count`, `first_seen`, `last_seen`,
//! `sample_subjects`). Selection and AI artifacts are written by the
//! session and the action coordinator.

mod aggregator;
mod model;

pub use aggregator::{Aggregator, ScanGeneration};
pub use model::{
    ActionKind, AiArtifact, DeletionRequest, DomainRecord, SAMPLE_SUBJECT_LIMIT,
};
