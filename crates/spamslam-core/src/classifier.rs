//! Message classification.
//!
//! Relevance is decided up front by the mailbox search ([`CandidateQuery`]):
//! only messages carrying a signup/marketing marker, newer than the
//! retention window, are ever listed. The classifier itself only decides
//! which domain a listed message is attributed to.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::gateway::RawMessage;

/// Phrases that mark account-signup or marketing mail.
pub const SIGNUP_MARKERS: &[&str] = &[
    "welcome",
    "confirm your",
    "verify your",
    "create account",
    "complete registration",
    "thanks for registering",
    "unsubscribe",
    "account created",
];

/// Default look-back window for a scan.
pub const DEFAULT_SINCE_DAYS: u32 = 365;

/// Default cap on listed messages per scan.
pub const DEFAULT_MAX_RESULTS: u32 = 900;

#[allow(clippy::expect_used)] // Literal pattern, covered by tests
static SENDER_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid address pattern")
});

/// The mailbox search used to pick scan candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    /// Disjunction of phrase markers.
    pub markers: Vec<String>,
    /// Only messages newer than this many days.
    pub since_days: u32,
    /// Upper bound on listed messages.
    pub max_results: u32,
}

impl Default for CandidateQuery {
    fn default() -> Self {
        Self {
            markers: SIGNUP_MARKERS.iter().map(ToString::to_string).collect(),
            since_days: DEFAULT_SINCE_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl CandidateQuery {
    /// Renders the query in Gmail search syntax.
    ///
    /// Multi-word markers are quoted so they match as phrases.
    #[must_use]
    pub fn to_search_string(&self) -> String {
        let markers = self
            .markers
            .iter()
            .map(|marker| {
                if marker.contains(char::is_whitespace) {
                    format!("\"{marker}\"")
                } else {
                    marker.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        format!("({markers}) newer_than:{}d", self.since_days)
    }
}

/// A message reduced to what the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    /// Sender address, lowercase (or the raw header when none was found).
    pub address: String,
    /// Attribution domain.
    pub domain: String,
    /// Subject line as received.
    pub subject: String,
    /// Delivery timestamp, if known.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Classifies one fetched message. Never fails: malformed headers produce
/// best-effort values.
#[must_use]
pub fn classify(raw: &RawMessage) -> ClassifiedMessage {
    let address = sender_address(&raw.from);
    let domain = sender_domain(&address);

    ClassifiedMessage {
        address,
        domain,
        subject: raw.subject.clone(),
        timestamp: raw.internal_date,
    }
}

/// Extracts the first `local@domain` address from a `From` header,
/// falling back to the whole header. The result is lowercase.
#[must_use]
pub fn sender_address(from: &str) -> String {
    SENDER_ADDRESS
        .find(from)
        .map_or(from, |m| m.as_str())
        .to_lowercase()
}

/// Derives the attribution domain from a sender address.
///
/// Takes the label run after the first `@` and strips a leading `www.`.
/// Without an `@` the whole input is the domain.
#[must_use]
pub fn sender_domain(address: &str) -> String {
    let host = address.split('@').nth(1).unwrap_or(address).to_lowercase();
    normalize_domain(&host)
}

/// Normalizes a domain key: lowercase, no leading `www.` label.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}
