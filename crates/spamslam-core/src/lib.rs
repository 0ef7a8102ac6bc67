//! # spamslam-core
//!
//! Inbox-to-domain aggregation engine for `SpamSlam`.
//!
//! This crate provides:
//! - **Classifier** - sender address and domain extraction from raw headers
//! - **Inventory** - the per-domain record set and its merge rules
//! - **View** - filter, sort and paginate the inventory for display
//! - **Actions** - selection, AI-generated unsubscribe/deletion text, drafts
//! - **Scan** - batched, concurrent inbox scanning with stale-scan guarding
//! - **Snapshot** - per-identity persistence of the inventory
//!
//! Network access lives behind the [`MailGateway`] and [`AiGateway`] traits;
//! concrete implementations are provided by `spamslam-google`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use spamslam_core::{Identity, ScanPolicy, Session, scan};
//! use tokio::sync::Mutex;
//!
//! let session = Mutex::new(Session::signed_in(identity, None));
//! let report = scan::run(&Arc::new(gmail), &session, &ScanPolicy::default(), |progress| {
//!     println!("{}/{} messages", progress.processed, progress.total);
//! })
//! .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod actions;
pub mod classifier;
mod error;
pub mod gateway;
pub mod inventory;
pub mod scan;
pub mod session;
pub mod snapshot;
pub mod view;

pub use actions::{ActionOutcome, ActionPolicy, ActionReport, create_draft, run_action};
pub use classifier::{CandidateQuery, ClassifiedMessage, classify};
pub use error::{Error, Result};
pub use gateway::{
    AiGateway, DraftReceipt, GatewayError, GatewayResult, MailGateway, MessageId, OutgoingDraft,
    RawMessage,
};
pub use inventory::{
    ActionKind, Aggregator, AiArtifact, DeletionRequest, DomainRecord, ScanGeneration,
};
pub use scan::{ScanPolicy, ScanProgress, ScanReport};
pub use session::{Identity, Rendered, Session, Summary};
pub use snapshot::{InventorySnapshot, SnapshotRepository};
pub use view::{PAGE_SIZE, Page, PageButton, SelectAllState, SortMode, UnknownSortMode, ViewState};
