//! Contracts for the external collaborators the engine drives.
//!
//! The core never speaks HTTP. A mail provider implements [`MailGateway`]
//! and a text-generation backend implements [`AiGateway`]; the scan driver
//! and the action coordinator are generic over both so tests can run
//! against in-memory fakes.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};

use crate::classifier::CandidateQuery;

/// Errors reported by gateway implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a usable response.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The provider rejected our credentials.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The provider answered with something we could not decode.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The provider understood the request and refused it.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Provider identifier of a message in the remote mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Creates a message ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The header subset of one fetched message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Raw `From` header value (empty when absent).
    pub from: String,
    /// Raw `Subject` header value (empty when absent).
    pub subject: String,
    /// Delivery timestamp as recorded by the provider.
    pub internal_date: Option<DateTime<Utc>>,
}

impl RawMessage {
    /// Creates a raw message from header values.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        subject: impl Into<String>,
        internal_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            internal_date,
        }
    }
}

/// A plain-text draft to be created in the user's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDraft {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

/// Confirmation returned after a draft was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReceipt {
    /// Provider identifier of the new draft.
    pub draft_id: String,
}

/// Mailbox access: candidate listing, header fetch and draft creation.
pub trait MailGateway: Send + Sync {
    /// Lists the IDs of messages matching the candidate query, newest first,
    /// returning at most `query.max_results` IDs.
    fn list_candidate_messages(
        &self,
        query: &CandidateQuery,
    ) -> impl Future<Output = GatewayResult<Vec<MessageId>>> + Send;

    /// Fetches the headers of one message.
    fn fetch_message(
        &self,
        id: &MessageId,
    ) -> impl Future<Output = GatewayResult<RawMessage>> + Send;

    /// Creates a draft in the user's mailbox.
    fn create_draft(
        &self,
        draft: &OutgoingDraft,
    ) -> impl Future<Output = GatewayResult<DraftReceipt>> + Send;
}

/// Free-text generation backend.
pub trait AiGateway: Send + Sync {
    /// Generates a reply for a single-turn prompt.
    fn generate(&self, prompt: &str) -> impl Future<Output = GatewayResult<String>> + Send;
}
