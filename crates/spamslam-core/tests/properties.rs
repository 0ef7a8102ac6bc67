//! Property tests for the aggregation and projection rules.

#![allow(clippy::unwrap_used)]

use chrono::DateTime;
use proptest::prelude::*;
use spamslam_core::classifier::{normalize_domain, sender_domain};
use spamslam_core::view::{self, ViewState};
use spamslam_core::{Aggregator, PAGE_SIZE, SortMode};

/// `(domain index, local part, subject, millis)`
type Arrival = (usize, String, String, Option<i64>);

const DOMAINS: [&str; 4] = ["netflix.com", "spotify.com", "uber.com", "shop.example"];

fn arrival() -> impl Strategy<Value = Arrival> {
    (
        0..DOMAINS.len(),
        "[a-z]{1,6}",
        "[A-Za-z ]{0,12}",
        proptest::option::of(0i64..4_000_000_000_000),
    )
}

fn aggregate(arrivals: &[Arrival]) -> Aggregator {
    let mut agg = Aggregator::new();
    for (domain, local, subject, millis) in arrivals {
        let domain = DOMAINS[*domain];
        agg.attribute(
            domain,
            &format!("{local}@{domain}"),
            subject,
            millis.and_then(DateTime::from_timestamp_millis),
        );
    }
    agg
}

proptest! {
    #[test]
    fn counts_are_order_independent(
        arrivals in prop::collection::vec(arrival(), 0..40),
        shift in 0usize..40,
    ) {
        let mut reversed = arrivals.clone();
        reversed.rotate_left(shift % arrivals.len().max(1));
        reversed.reverse();

        let a = aggregate(&arrivals);
        let b = aggregate(&reversed);

        prop_assert_eq!(a.record_count(), b.record_count());
        prop_assert_eq!(a.total_message_count(), b.total_message_count());
        for record in a.records() {
            let other = b.get(record.domain()).unwrap();
            prop_assert_eq!(record.message_count(), other.message_count());
            prop_assert_eq!(record.email_counts(), other.email_counts());
            prop_assert_eq!(record.first_seen(), other.first_seen());
            prop_assert_eq!(record.last_seen(), other.last_seen());
        }
    }

    #[test]
    fn message_count_is_sum_of_address_counts(arrivals in prop::collection::vec(arrival(), 0..40)) {
        let agg = aggregate(&arrivals);

        prop_assert_eq!(agg.total_message_count(), arrivals.len() as u64);
        for record in agg.records() {
            prop_assert!(record.message_count() >= 1);
            prop_assert_eq!(record.message_count(), record.email_counts().values().sum::<u64>());
        }
    }

    #[test]
    fn first_seen_never_after_last_seen(arrivals in prop::collection::vec(arrival(), 1..40)) {
        let agg = aggregate(&arrivals);

        for record in agg.records() {
            if let (Some(first), Some(last)) = (record.first_seen(), record.last_seen()) {
                prop_assert!(first <= last);
            }
        }
    }

    #[test]
    fn sample_subjects_are_capped_and_non_empty(arrivals in prop::collection::vec(arrival(), 0..40)) {
        let agg = aggregate(&arrivals);

        for record in agg.records() {
            prop_assert!(record.sample_subjects().len() <= 3);
            prop_assert!(record.sample_subjects().iter().all(|s| !s.is_empty()));
        }
    }

    #[test]
    fn pages_partition_the_filtered_set(
        count in 0usize..40,
        page in 1usize..10,
        sort in prop::sample::select(vec![SortMode::Frequency, SortMode::Recency, SortMode::Alphabetical]),
    ) {
        let mut agg = Aggregator::new();
        for i in 0..count {
            agg.attribute(&format!("d{i}.example"), "x@x.example", "", None);
        }
        let mut state = ViewState::default();
        state.set_sort(sort);
        state.set_page(page);

        let projected = view::project(agg.records(), &mut state);

        prop_assert!(projected.number >= 1);
        prop_assert!(projected.number <= projected.total_pages);
        prop_assert!(projected.items.len() <= PAGE_SIZE);
        prop_assert_eq!(projected.total_pages, count.div_ceil(PAGE_SIZE).max(1));
    }

    #[test]
    fn domain_normalization_is_idempotent(host in "(www\\.)?[a-vx-z][A-Za-z]{0,9}\\.[a-z]{2,4}") {
        let once = normalize_domain(&host);
        prop_assert_eq!(normalize_domain(&once), once.clone());
        prop_assert_eq!(sender_domain(&format!("x@{host}")), once);
    }
}
