//! Selection-driven actions: AI-generated unsubscribe steps and deletion
//! requests, and turning a deletion request into a mailbox draft.
//!
//! Each domain is processed independently. A failed AI call is recorded for
//! that domain and the loop moves on; it never aborts the batch.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::{AiGateway, DraftReceipt, MailGateway, OutgoingDraft};
use crate::inventory::{ActionKind, AiArtifact, DeletionRequest};
use crate::session::{Identity, Session};
use crate::{Error, Result};

/// Default pause between consecutive AI calls.
pub const DEFAULT_ACTION_PAUSE: Duration = Duration::from_millis(150);

/// Subject used when a deletion reply is not structured.
pub const FALLBACK_DELETION_SUBJECT: &str = "Data deletion request";

/// Throttling for bulk actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPolicy {
    /// Pause between consecutive AI calls.
    pub pause: Duration,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            pause: DEFAULT_ACTION_PAUSE,
        }
    }
}

/// Result of an action for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The artifact was generated and stored on the record.
    Generated(AiArtifact),
    /// The action failed for this domain only.
    Failed(String),
}

impl ActionOutcome {
    /// True if the artifact was generated.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

/// Per-domain results of a bulk action, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// Which action ran.
    pub kind: ActionKind,
    /// One entry per requested domain.
    pub outcomes: Vec<(String, ActionOutcome)>,
}

impl ActionReport {
    /// Outcome for a domain.
    #[must_use]
    pub fn outcome(&self, domain: &str) -> Option<&ActionOutcome> {
        self.outcomes
            .iter()
            .find(|(d, _)| d == domain)
            .map(|(_, outcome)| outcome)
    }

    /// Number of domains that succeeded.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_generated())
            .count()
    }

    /// Number of domains that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.generated_count()
    }
}

/// Builds the generation prompt for a domain.
#[must_use]
pub fn prompt_for(kind: ActionKind, domain: &str) -> String {
    match kind {
        ActionKind::Unsubscribe => format!(
            "Provide short step-by-step unsubscribe instructions for {domain}. \
             If none exist, suggest contacting support@{domain} or visiting \
             {domain}/account -> email preferences."
        ),
        ActionKind::Deletion => format!(
            "Create a polite GDPR-style data deletion request to support@{domain}. \
             Output JSON with keys \"subject\" and \"body\". \
             Use placeholders {{name}} and {{email}}."
        ),
    }
}

/// Parses a deletion reply as `{subject, body}` JSON.
///
/// Accepts a bare object or one wrapped in a fenced code block. Both fields
/// must be non-empty strings.
#[must_use]
pub fn parse_deletion_reply(reply: &str) -> Option<DeletionRequest> {
    let trimmed = reply.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|inner| inner.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let subject = value.get("subject")?.as_str()?.trim();
    let body = value.get("body")?.as_str()?;
    if subject.is_empty() || body.trim().is_empty() {
        return None;
    }

    Some(DeletionRequest {
        subject: subject.to_string(),
        body: body.to_string(),
    })
}

/// Turns a raw reply into the artifact stored for `kind`.
#[must_use]
pub fn artifact_from_reply(kind: ActionKind, reply: String) -> AiArtifact {
    match kind {
        ActionKind::Unsubscribe => AiArtifact::Text(reply),
        ActionKind::Deletion => {
            parse_deletion_reply(&reply).map_or(AiArtifact::Text(reply), AiArtifact::Deletion)
        }
    }
}

/// Display text for a stored artifact. An unstructured deletion reply is
/// shown under [`FALLBACK_DELETION_SUBJECT`].
#[must_use]
pub fn display_text(kind: ActionKind, artifact: &AiArtifact) -> String {
    match (kind, artifact) {
        (ActionKind::Deletion, AiArtifact::Text(text)) => {
            format!("Subject: {FALLBACK_DELETION_SUBJECT}\n\n{text}")
        }
        _ => artifact.to_display_text(),
    }
}

/// Substitutes `{name}` and `{email}` with the identity's details.
#[must_use]
pub fn fill_placeholders(text: &str, identity: &Identity) -> String {
    text.replace("{name}", identity.name())
        .replace("{email}", &identity.email)
}

/// Runs an AI action for each domain and stores the results.
///
/// Domains are processed one at a time with `policy.pause` between calls.
/// The session lock is not held while waiting on the gateway.
///
/// # Errors
///
/// Returns [`Error::NotSignedIn`] in guest mode and
/// [`Error::NothingSelected`] for an empty domain list. Per-domain failures
/// are reported in the [`ActionReport`], not as errors.
pub async fn run_action<A: AiGateway>(
    ai: &A,
    session: &Mutex<Session>,
    kind: ActionKind,
    domains: &[String],
    policy: &ActionPolicy,
) -> Result<ActionReport> {
    let mut pending: Vec<String> = Vec::with_capacity(domains.len());
    for domain in domains {
        if !pending.contains(domain) {
            pending.push(domain.clone());
        }
    }

    {
        let session = session.lock().await;
        session.require_identity()?;
    }
    if pending.is_empty() {
        return Err(Error::NothingSelected);
    }

    info!(action = kind.as_str(), count = pending.len(), "Running action");

    let mut outcomes = Vec::with_capacity(pending.len());
    for (position, domain) in pending.into_iter().enumerate() {
        if position > 0 {
            tokio::time::sleep(policy.pause).await;
        }

        let known = session.lock().await.record(&domain).is_some();
        if !known {
            warn!(%domain, "Skipping action for unknown company");
            outcomes.push((domain.clone(), ActionOutcome::Failed(format!("Unknown company: {domain}"))));
            continue;
        }

        let prompt = prompt_for(kind, &domain);
        let outcome = match ai.generate(&prompt).await {
            Ok(reply) => {
                let artifact = artifact_from_reply(kind, reply);
                let mut guard = session.lock().await;
                match guard.record_mut(&domain) {
                    Some(record) => {
                        record.store_artifact(kind, artifact.clone());
                        debug!(%domain, action = kind.as_str(), "Stored artifact");
                        ActionOutcome::Generated(artifact)
                    }
                    None => {
                        warn!(%domain, "Company disappeared while generating");
                        ActionOutcome::Failed(format!("{domain} is no longer in the inventory"))
                    }
                }
            }
            Err(e) => {
                warn!(%domain, action = kind.as_str(), error = %e, "AI call failed");
                ActionOutcome::Failed(format!("AI error: {e}"))
            }
        };
        outcomes.push((domain, outcome));
    }

    let report = ActionReport { kind, outcomes };
    info!(
        action = kind.as_str(),
        generated = report.generated_count(),
        failed = report.failed_count(),
        "Action finished"
    );
    Ok(report)
}

/// Creates a mailbox draft from a domain's stored deletion request.
///
/// The recipient is the first sender address attributed to the domain, or
/// `support@<domain>`. Placeholders are filled from the identity. The
/// inventory is not modified.
///
/// # Errors
///
/// Returns a precondition error when signed out, when the domain is
/// unknown, or when no structured deletion request is stored; returns
/// [`Error::Gateway`] if the draft could not be created.
pub async fn create_draft<M: MailGateway>(
    mail: &M,
    session: &Mutex<Session>,
    domain: &str,
) -> Result<DraftReceipt> {
    let draft = {
        let session = session.lock().await;
        let identity = session.require_identity()?;
        let record = session
            .record(domain)
            .ok_or_else(|| Error::UnknownDomain(domain.to_string()))?;
        let request = match record.artifact(ActionKind::Deletion) {
            None => return Err(Error::MissingArtifact(domain.to_string())),
            Some(artifact) => artifact
                .as_deletion()
                .ok_or_else(|| Error::UnparseableArtifact(domain.to_string()))?,
        };

        OutgoingDraft {
            to: record.draft_recipient(),
            subject: fill_placeholders(&request.subject, identity),
            body: fill_placeholders(&request.body, identity),
        }
    };

    let receipt = mail.create_draft(&draft).await?;
    info!(%domain, to = %draft.to, draft_id = %receipt.draft_id, "Draft created");
    Ok(receipt)
}
