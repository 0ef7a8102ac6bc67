//! Inventory data models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::classifier::normalize_domain;

/// Number of sample subjects kept per domain.
pub const SAMPLE_SUBJECT_LIMIT: usize = 3;

/// Kind of AI-assisted action taken on a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Step-by-step unsubscribe instructions.
    Unsubscribe,
    /// A GDPR-style data deletion request.
    Deletion,
}

impl ActionKind {
    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unsubscribe" => Some(Self::Unsubscribe),
            "deletion" | "delete" => Some(Self::Deletion),
            _ => None,
        }
    }

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsubscribe => "unsubscribe",
            Self::Deletion => "deletion",
        }
    }

    /// Human-readable name of the generated artifact.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Unsubscribe => "Unsubscribe steps",
            Self::Deletion => "Deletion request",
        }
    }
}

/// A deletion request split into subject and body.
///
/// The body may still contain `{name}` and `{email}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// The stored result of an AI action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiArtifact {
    /// Free text as returned by the generator.
    Text(String),
    /// A structured deletion request.
    Deletion(DeletionRequest),
}

impl AiArtifact {
    /// Returns the structured deletion request, if this is one.
    #[must_use]
    pub const fn as_deletion(&self) -> Option<&DeletionRequest> {
        match self {
            Self::Deletion(request) => Some(request),
            Self::Text(_) => None,
        }
    }

    /// Renders the artifact as display text.
    #[must_use]
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Deletion(request) => format!("Subject: {}\n\n{}", request.subject, request.body),
        }
    }
}

/// Everything known about one sending domain.
///
/// Counting fields are private: they only change through the aggregator,
/// which keeps `message_count` equal to the sum of `email_counts` and
/// `first_seen <= last_seen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    domain: String,
    #[serde(default)]
    email_counts: BTreeMap<String, u64>,
    #[serde(default)]
    first_address: Option<String>,
    #[serde(default)]
    message_count: u64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    first_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    sample_subjects: Vec<String>,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    ai_artifacts: BTreeMap<ActionKind, AiArtifact>,
}

impl DomainRecord {
    /// Creates an empty record for a domain.
    pub(crate) fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            email_counts: BTreeMap::new(),
            first_address: None,
            message_count: 0,
            first_seen: None,
            last_seen: None,
            sample_subjects: Vec::new(),
            selected: false,
            ai_artifacts: BTreeMap::new(),
        }
    }

    /// The domain key.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Occurrences per sender address.
    #[must_use]
    pub const fn email_counts(&self) -> &BTreeMap<String, u64> {
        &self.email_counts
    }

    /// Total attributed messages.
    #[must_use]
    pub const fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Earliest delivery timestamp seen.
    #[must_use]
    pub const fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.first_seen
    }

    /// Latest delivery timestamp seen.
    #[must_use]
    pub const fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Up to three subjects, in the order they were first kept.
    #[must_use]
    pub fn sample_subjects(&self) -> &[String] {
        &self.sample_subjects
    }

    /// Whether the user has selected this domain.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// The last artifact generated for an action kind.
    #[must_use]
    pub fn artifact(&self, kind: ActionKind) -> Option<&AiArtifact> {
        self.ai_artifacts.get(&kind)
    }

    /// All stored artifacts.
    #[must_use]
    pub const fn artifacts(&self) -> &BTreeMap<ActionKind, AiArtifact> {
        &self.ai_artifacts
    }

    /// The first sender address attributed to this domain.
    #[must_use]
    pub fn primary_address(&self) -> Option<&str> {
        self.first_address.as_deref()
    }

    /// Where a deletion request for this domain should be sent.
    #[must_use]
    pub fn draft_recipient(&self) -> String {
        self.primary_address()
            .filter(|address| address.contains('@'))
            .map_or_else(|| format!("support@{}", self.domain), ToString::to_string)
    }

    /// Logo image URL for renderers.
    #[must_use]
    pub fn logo_url(&self) -> String {
        format!("https://logo.clearbit.com/{}", self.domain)
    }

    /// Case-insensitive match against domain, sender addresses and the
    /// joined sample subjects. `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        self.domain.to_lowercase().contains(needle)
            || self
                .email_counts
                .keys()
                .any(|address| address.to_lowercase().contains(needle))
            || self.sample_subjects.join(" ").to_lowercase().contains(needle)
    }

    /// Folds one message into the record.
    pub(crate) fn record_message(
        &mut self,
        address: &str,
        subject: &str,
        timestamp: Option<DateTime<Utc>>,
    ) {
        self.message_count += 1;
        *self.email_counts.entry(address.to_string()).or_insert(0) += 1;
        if self.first_address.is_none() {
            self.first_address = Some(address.to_string());
        }

        if let Some(ts) = timestamp {
            self.first_seen = Some(self.first_seen.map_or(ts, |first| first.min(ts)));
            self.last_seen = Some(self.last_seen.map_or(ts, |last| last.max(ts)));
        }

        if !subject.is_empty() && self.sample_subjects.len() < SAMPLE_SUBJECT_LIMIT {
            self.sample_subjects.push(subject.to_string());
        }
    }

    pub(crate) const fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn store_artifact(&mut self, kind: ActionKind, artifact: AiArtifact) {
        self.ai_artifacts.insert(kind, artifact);
    }

    /// Repairs a record decoded from storage so it satisfies the record
    /// invariants. Returns `None` for records with no attributed messages.
    pub(crate) fn normalized(mut self) -> Option<Self> {
        self.domain = normalize_domain(&self.domain);

        let mut counts = BTreeMap::new();
        for (address, count) in std::mem::take(&mut self.email_counts) {
            if count > 0 {
                *counts.entry(address.to_lowercase()).or_insert(0) += count;
            }
        }
        self.email_counts = counts;
        self.message_count = self.email_counts.values().sum();
        if self.message_count == 0 {
            return None;
        }

        // Older snapshots carry no first address; fall back to the first key.
        self.first_address = self
            .first_address
            .take()
            .map(|address| address.to_lowercase())
            .filter(|address| self.email_counts.contains_key(address))
            .or_else(|| self.email_counts.keys().next().cloned());

        if let (Some(first), Some(last)) = (self.first_seen, self.last_seen)
            && first > last
        {
            self.first_seen = Some(last);
            self.last_seen = Some(first);
        }

        self.sample_subjects.retain(|subject| !subject.is_empty());
        self.sample_subjects.truncate(SAMPLE_SUBJECT_LIMIT);

        Some(self)
    }
}

/// Accepts RFC 3339 strings or epoch milliseconds; anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ts(millis: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
    }

    #[test]
    fn test_action_kind_roundtrip() {
        for kind in [ActionKind::Unsubscribe, ActionKind::Deletion] {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("archive"), None);
    }

    #[test]
    fn test_record_message_updates_bounds() {
        let mut record = DomainRecord::new("netflix.com");

        record.record_message("info@netflix.com", "Welcome", ts(2_000));
        record.record_message("info@netflix.com", "", ts(1_000));
        record.record_message("billing@netflix.com", "Receipt", None);

        assert_eq!(record.message_count(), 3);
        assert_eq!(record.email_counts()["info@netflix.com"], 2);
        assert_eq!(record.first_seen(), ts(1_000));
        assert_eq!(record.last_seen(), ts(2_000));
        assert_eq!(record.sample_subjects(), ["Welcome", "Receipt"]);
    }

    #[test]
    fn test_sample_subjects_first_three_kept() {
        let mut record = DomainRecord::new("shop.example");
        for subject in ["one", "two", "three", "four"] {
            record.record_message("news@shop.example", subject, None);
        }

        assert_eq!(record.sample_subjects(), ["one", "two", "three"]);
    }

    #[test]
    fn test_primary_address_and_recipient() {
        let mut record = DomainRecord::new("amazon.com");
        assert_eq!(record.draft_recipient(), "support@amazon.com");

        record.record_message("news@amazon.com", "", None);

        assert_eq!(record.primary_address(), Some("news@amazon.com"));
        assert_eq!(record.draft_recipient(), "news@amazon.com");
    }

    #[test]
    fn test_recipient_is_first_address_not_most_frequent() {
        let mut record = DomainRecord::new("x.com");
        record.record_message("news@x.com", "", None);
        record.record_message("no-reply@x.com", "", None);
        record.record_message("no-reply@x.com", "", None);

        assert_eq!(record.draft_recipient(), "news@x.com");
    }

    #[test]
    fn test_recipient_is_first_address_not_smallest() {
        let mut record = DomainRecord::new("x.com");
        record.record_message("zed@x.com", "", None);
        record.record_message("amy@x.com", "", None);

        assert_eq!(record.draft_recipient(), "zed@x.com");
    }

    #[test]
    fn test_first_address_survives_storage() {
        let mut record = DomainRecord::new("x.com");
        record.record_message("zed@x.com", "", None);
        record.record_message("amy@x.com", "", None);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""firstAddress":"zed@x.com""#));
        let restored: DomainRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.normalized().unwrap().draft_recipient(), "zed@x.com");

        let legacy = r#"{"domain": "x.com", "emailCounts": {"zed@x.com": 1, "amy@x.com": 2}}"#;
        let legacy: DomainRecord = serde_json::from_str(legacy).unwrap();
        assert_eq!(legacy.normalized().unwrap().draft_recipient(), "amy@x.com");

        let stale = r#"{"domain": "x.com", "emailCounts": {"amy@x.com": 2}, "firstAddress": "gone@x.com"}"#;
        let stale: DomainRecord = serde_json::from_str(stale).unwrap();
        assert_eq!(stale.normalized().unwrap().draft_recipient(), "amy@x.com");
    }

    #[test]
    fn test_recipient_ignores_degenerate_address() {
        let mut record = DomainRecord::new("mailer daemon");
        record.record_message("mailer daemon", "", None);

        assert_eq!(record.draft_recipient(), "support@mailer daemon");
    }

    #[test]
    fn test_matches_subjects_and_addresses() {
        let mut record = DomainRecord::new("spotify.com");
        record.record_message("no-reply@spotify.com", "Your Weekly Mix", None);

        assert!(record.matches(""));
        assert!(record.matches("spot"));
        assert!(record.matches("no-reply"));
        assert!(record.matches("weekly mix"));
        assert!(!record.matches("netflix"));
    }

    #[test]
    fn test_deserialize_lenient_record() {
        let json = r#"{
            "domain": "WWW.Uber.com",
            "emailCounts": {"Account@uber.com": 4, "ghost@uber.com": 0},
            "messageCount": 99,
            "firstSeen": "2025-01-18T15:00:00Z",
            "lastSeen": 1655798400000,
            "sampleSubjects": ["", "Ride receipt", "a", "b", "c"],
            "unknownField": true
        }"#;

        let record: DomainRecord = serde_json::from_str(json).unwrap();
        let record = record.normalized().unwrap();

        assert_eq!(record.domain(), "uber.com");
        assert_eq!(record.message_count(), 4);
        assert_eq!(record.email_counts().len(), 1);
        assert!(record.first_seen() <= record.last_seen());
        assert_eq!(record.sample_subjects(), ["Ride receipt", "a", "b"]);
    }

    #[test]
    fn test_normalized_drops_empty_record() {
        let record = DomainRecord::new("empty.example");
        assert!(record.normalized().is_none());
    }

    #[test]
    fn test_unparseable_timestamp_becomes_none() {
        let json = r#"{"domain": "a.com", "emailCounts": {"x@a.com": 1}, "lastSeen": "yesterday"}"#;
        let record: DomainRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.last_seen(), None);
    }

    #[test]
    fn test_artifacts_serialize_by_kind() {
        let mut record = DomainRecord::new("a.com");
        record.record_message("x@a.com", "", None);
        record.store_artifact(ActionKind::Unsubscribe, AiArtifact::Text("Step 1".into()));
        record.store_artifact(
            ActionKind::Deletion,
            AiArtifact::Deletion(DeletionRequest {
                subject: "Delete my data".into(),
                body: "Hello".into(),
            }),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["aiArtifacts"]["unsubscribe"]["text"], "Step 1");
        assert_eq!(
            json["aiArtifacts"]["deletion"]["deletion"]["subject"],
            "Delete my data"
        );

        let back: DomainRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
