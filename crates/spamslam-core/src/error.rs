//! Error types for the core library.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The operation needs a signed-in identity.
    #[error("Connect your Gmail to perform this action")]
    NotSignedIn,

    /// A bulk action was requested with no companies selected.
    #[error("Select some companies first")]
    NothingSelected,

    /// The domain has no record in the inventory.
    #[error("Unknown company: {0}")]
    UnknownDomain(String),

    /// No deletion request has been generated for the domain yet.
    #[error("No deletion request generated for {0} yet")]
    MissingArtifact(String),

    /// The stored deletion request is free text, not a subject/body pair.
    #[error("Deletion request for {0} is not parseable as subject and body")]
    UnparseableArtifact(String),

    /// An external collaborator failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl Error {
    /// Returns true for precondition violations, which never mutate state.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotSignedIn
                | Self::NothingSelected
                | Self::UnknownDomain(_)
                | Self::MissingArtifact(_)
                | Self::UnparseableArtifact(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
