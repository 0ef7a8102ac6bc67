//! Domain-keyed accumulator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::model::DomainRecord;
use crate::classifier::ClassifiedMessage;

/// Identifies one scan. Every [`Aggregator::reset`] starts a new generation;
/// attributions tagged with an older one are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanGeneration(u64);

impl ScanGeneration {
    /// The numeric value, for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The canonical per-domain record set.
///
/// Records keep their creation order, which is the tie-break order for
/// every sort in the view.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<DomainRecord>,
    index: HashMap<String, usize>,
    generation: ScanGeneration,
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every record and starts a new scan generation.
    pub fn reset(&mut self) -> ScanGeneration {
        self.records.clear();
        self.index.clear();
        self.generation = ScanGeneration(self.generation.0 + 1);
        debug!(generation = self.generation.0, "Aggregator reset");
        self.generation
    }

    /// The current scan generation.
    #[must_use]
    pub const fn generation(&self) -> ScanGeneration {
        self.generation
    }

    /// Upserts the record for `domain` and folds one message into it.
    pub fn attribute(
        &mut self,
        domain: &str,
        address: &str,
        subject: &str,
        timestamp: Option<DateTime<Utc>>,
    ) {
        let slot = match self.index.get(domain) {
            Some(&slot) => slot,
            None => {
                self.records.push(DomainRecord::new(domain));
                self.index.insert(domain.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };

        self.records[slot].record_message(address, subject, timestamp);
    }

    /// Attributes a classified message.
    pub fn attribute_message(&mut self, message: &ClassifiedMessage) {
        self.attribute(
            &message.domain,
            &message.address,
            &message.subject,
            message.timestamp,
        );
    }

    /// Attributes a message on behalf of a scan.
    ///
    /// Returns `false`, leaving state untouched, when `generation` has been
    /// superseded by a later reset.
    pub fn attribute_for(&mut self, generation: ScanGeneration, message: &ClassifiedMessage) -> bool {
        if generation != self.generation {
            debug!(
                stale = generation.0,
                current = self.generation.0,
                domain = %message.domain,
                "Discarding attribution from superseded scan"
            );
            return false;
        }

        self.attribute_message(message);
        true
    }

    /// Number of distinct domains.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Sum of all message counts.
    #[must_use]
    pub fn total_message_count(&self) -> u64 {
        self.records.iter().map(DomainRecord::message_count).sum()
    }

    /// All records in creation order.
    #[must_use]
    pub fn records(&self) -> &[DomainRecord] {
        &self.records
    }

    /// Looks up a record by domain.
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&DomainRecord> {
        self.index.get(domain).map(|&slot| &self.records[slot])
    }

    pub(crate) fn get_mut(&mut self, domain: &str) -> Option<&mut DomainRecord> {
        self.index.get(domain).map(|&slot| &mut self.records[slot])
    }

    /// Replaces the record set with previously saved records.
    ///
    /// Records are normalized on the way in; when two records share a
    /// domain the first one wins. Starts a new generation, so a scan that
    /// was running against the old state can no longer write.
    pub fn restore(&mut self, records: impl IntoIterator<Item = DomainRecord>) {
        self.reset();
        for record in records.into_iter().filter_map(DomainRecord::normalized) {
            if self.index.contains_key(record.domain()) {
                continue;
            }
            self.index
                .insert(record.domain().to_string(), self.records.len());
            self.records.push(record);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(domain: &str, address: &str, subject: &str, millis: Option<i64>) -> ClassifiedMessage {
        ClassifiedMessage {
            address: address.to_string(),
            domain: domain.to_string(),
            subject: subject.to_string(),
            timestamp: millis.and_then(DateTime::from_timestamp_millis),
        }
    }

    #[test]
    fn test_attribute_creates_then_updates() {
        let mut agg = Aggregator::new();

        agg.attribute("netflix.com", "info@netflix.com", "Welcome", None);
        agg.attribute("netflix.com", "info@netflix.com", "Account update", None);
        agg.attribute("spotify.com", "no-reply@spotify.com", "Try Premium", None);

        assert_eq!(agg.record_count(), 2);
        assert_eq!(agg.total_message_count(), 3);
        assert_eq!(agg.get("netflix.com").unwrap().message_count(), 2);
        assert_eq!(agg.records()[0].domain(), "netflix.com");
    }

    #[test]
    fn test_reset_clears_and_advances_generation() {
        let mut agg = Aggregator::new();
        let first = agg.generation();
        agg.attribute("a.com", "x@a.com", "", None);

        let second = agg.reset();

        assert_ne!(first, second);
        assert_eq!(agg.record_count(), 0);
        assert_eq!(agg.total_message_count(), 0);
        assert!(agg.get("a.com").is_none());
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut agg = Aggregator::new();
        let stale = agg.reset();
        let current = agg.reset();

        assert!(agg.attribute_for(current, &message("new.com", "n@new.com", "", None)));
        assert!(!agg.attribute_for(stale, &message("old.com", "o@old.com", "", None)));

        assert_eq!(agg.record_count(), 1);
        assert!(agg.get("old.com").is_none());
    }

    #[test]
    fn test_restore_normalizes_and_dedupes() {
        let mut source = Aggregator::new();
        source.attribute_message(&message("a.com", "x@a.com", "Hi", Some(5)));
        let mut duplicate = DomainRecord::new("A.com");
        duplicate.record_message("y@a.com", "", None);
        let empty = DomainRecord::new("empty.com");

        let mut agg = Aggregator::new();
        let before = agg.generation();
        agg.restore(vec![source.records()[0].clone(), duplicate, empty]);

        assert!(agg.generation() > before);
        assert_eq!(agg.record_count(), 1);
        assert_eq!(agg.get("a.com").unwrap().sample_subjects(), ["Hi"]);
    }
}
