//! The session store: identity, inventory and view state in one owned
//! object.
//!
//! Without an identity the session is in guest mode. Guest mode is a
//! display policy: records may still be held in memory, but every count
//! reads zero and nothing is rendered.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::ClassifiedMessage;
use crate::inventory::{Aggregator, DomainRecord, ScanGeneration};
use crate::snapshot::InventorySnapshot;
use crate::view::{self, Page, SortMode, ViewState};
use crate::{Error, Result};

/// A signed-in user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Mailbox address.
    pub email: String,
    /// Name to greet the user with.
    pub display_name: Option<String>,
    /// Profile picture URL.
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Creates an identity with only an email address.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Key under which this identity's data is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.email.to_lowercase()
    }

    /// Display name, falling back to the email address.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Distinct domains.
    pub domains: usize,
    /// Attributed messages across all domains.
    pub messages: u64,
    /// Domains with at least one generated artifact.
    pub actioned: usize,
}

/// What the UI should draw for the company grid.
#[derive(Debug, Clone)]
pub enum Rendered<'a> {
    /// No identity: show the connect prompt, never records.
    Guest,
    /// Signed in, but nothing matches the current filter.
    NoMatches {
        /// Total pages (always 1).
        total_pages: usize,
    },
    /// A page of records.
    Page(Page<'a>),
}

/// Owned state for one user session.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
    aggregator: Aggregator,
    view: ViewState,
}

impl Session {
    /// Creates a guest session.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    /// Creates a signed-in session, restoring a snapshot if one exists.
    #[must_use]
    pub fn signed_in(identity: Identity, snapshot: Option<InventorySnapshot>) -> Self {
        let mut session = Self::default();
        session.sign_in(identity, snapshot);
        session
    }

    /// Establishes an identity and replaces the inventory with its snapshot
    /// (or an empty one).
    pub fn sign_in(&mut self, identity: Identity, snapshot: Option<InventorySnapshot>) {
        match snapshot {
            Some(snapshot) => self.aggregator.restore(snapshot.records),
            None => {
                self.aggregator.reset();
            }
        }
        self.view = ViewState::default();
        info!(
            email = %identity.email,
            domains = self.aggregator.record_count(),
            "Signed in"
        );
        self.identity = Some(identity);
    }

    /// Drops the identity and every record.
    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(email = %identity.email, "Signed out");
        }
        self.aggregator.reset();
        self.view = ViewState::default();
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True when no identity is established.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.identity.is_none()
    }

    /// The signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] in guest mode.
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity.as_ref().ok_or(Error::NotSignedIn)
    }

    /// Read access to the inventory.
    #[must_use]
    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Looks up a record. Always `None` in guest mode.
    #[must_use]
    pub fn record(&self, domain: &str) -> Option<&DomainRecord> {
        if self.is_guest() {
            return None;
        }
        self.aggregator.get(domain)
    }

    pub(crate) fn record_mut(&mut self, domain: &str) -> Option<&mut DomainRecord> {
        self.aggregator.get_mut(domain)
    }

    /// Clears the inventory for a new scan and returns its generation.
    pub fn begin_scan(&mut self) -> ScanGeneration {
        self.view.set_page(1);
        self.aggregator.reset()
    }

    /// Attributes a message for the given scan; stale scans are ignored.
    pub fn attribute(&mut self, generation: ScanGeneration, message: &ClassifiedMessage) -> bool {
        self.aggregator.attribute_for(generation, message)
    }

    /// Headline numbers; all zero in guest mode.
    #[must_use]
    pub fn summary(&self) -> Summary {
        if self.is_guest() {
            return Summary::default();
        }

        Summary {
            domains: self.aggregator.record_count(),
            messages: self.aggregator.total_message_count(),
            actioned: self
                .aggregator
                .records()
                .iter()
                .filter(|record| !record.artifacts().is_empty())
                .count(),
        }
    }

    /// Current view state.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Sets the search text (back to page 1).
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.set_query(query);
        self.clamp_page();
    }

    /// Sets the sort mode (back to page 1).
    pub fn set_sort(&mut self, sort: SortMode) {
        self.view.set_sort(sort);
    }

    /// Moves to a page, clamped into range.
    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        view::project(self.aggregator.records(), &mut self.view);
    }

    /// Projects the inventory for display.
    pub fn render(&mut self) -> Rendered<'_> {
        if self.is_guest() {
            return Rendered::Guest;
        }

        let page = view::project(self.aggregator.records(), &mut self.view);
        if page.is_empty() {
            Rendered::NoMatches {
                total_pages: page.total_pages,
            }
        } else {
            Rendered::Page(page)
        }
    }

    /// Flips the selection of one domain and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error in guest mode or for an unknown domain.
    pub fn toggle_selected(&mut self, domain: &str) -> Result<bool> {
        let selected = !self.selectable(domain)?.is_selected();
        self.set_selected(domain, selected)?;
        Ok(selected)
    }

    /// Sets the selection of exactly one domain.
    ///
    /// # Errors
    ///
    /// Returns an error in guest mode or for an unknown domain.
    pub fn set_selected(&mut self, domain: &str, selected: bool) -> Result<()> {
        self.selectable(domain)?;
        if let Some(record) = self.aggregator.get_mut(domain) {
            record.set_selected(selected);
        }
        Ok(())
    }

    fn selectable(&self, domain: &str) -> Result<&DomainRecord> {
        self.require_identity()?;
        self.aggregator
            .get(domain)
            .ok_or_else(|| Error::UnknownDomain(domain.to_string()))
    }

    /// Applies the select-all box to the records on the current page only.
    ///
    /// Returns the affected domains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] in guest mode.
    pub fn select_all_visible(&mut self, selected: bool) -> Result<Vec<String>> {
        self.require_identity()?;

        let visible = view::project(self.aggregator.records(), &mut self.view).visible_domains();
        for domain in &visible {
            if let Some(record) = self.aggregator.get_mut(domain) {
                record.set_selected(selected);
            }
        }

        debug!(count = visible.len(), selected, "Applied select-all to page");
        Ok(visible)
    }

    /// Selected domains, in creation order. Empty in guest mode.
    #[must_use]
    pub fn selected_domains(&self) -> Vec<String> {
        if self.is_guest() {
            return Vec::new();
        }

        self.aggregator
            .records()
            .iter()
            .filter(|record| record.is_selected())
            .map(|record| record.domain().to_string())
            .collect()
    }

    /// Takes a full-state snapshot for persistence.
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot::new(self.aggregator.records().to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::gateway::RawMessage;
    use crate::view::SelectAllState;

    fn select_all_state(session: &mut Session) -> SelectAllState {
        match session.render() {
            Rendered::Page(page) => page.select_all_state(),
            _ => panic!("expected a page"),
        }
    }

    fn seeded() -> Session {
        let mut session = Session::signed_in(Identity::new("me@example.com"), None);
        let generation = session.aggregator().generation();
        for i in 0..12 {
            let raw = RawMessage::new(format!("news@store{i}.example"), "Welcome", None);
            session.attribute(generation, &classify(&raw));
        }
        session
    }

    #[test]
    fn test_guest_mode_hides_everything() {
        let mut session = seeded();
        let generation = session.aggregator().generation();
        session.identity = None;
        session.attribute(generation, &classify(&RawMessage::new("a@b.com", "", None)));

        assert!(session.aggregator().record_count() > 0);
        assert_eq!(session.summary(), Summary::default());
        assert!(matches!(session.render(), Rendered::Guest));
        assert!(session.selected_domains().is_empty());
        assert!(session.record("b.com").is_none());
    }

    #[test]
    fn test_signed_in_no_matches() {
        let mut session = seeded();
        session.set_query("does-not-exist");

        assert!(matches!(
            session.render(),
            Rendered::NoMatches { total_pages: 1 }
        ));
    }

    #[test]
    fn test_summary_counts() {
        let session = seeded();
        let summary = session.summary();

        assert_eq!(summary.domains, 12);
        assert_eq!(summary.messages, 12);
        assert_eq!(summary.actioned, 0);
    }

    #[test]
    fn test_toggle_only_touches_one_record() {
        let mut session = seeded();

        assert!(session.toggle_selected("store3.example").unwrap());
        assert_eq!(session.selected_domains(), ["store3.example"]);
        assert!(!session.toggle_selected("store3.example").unwrap());
        assert!(session.selected_domains().is_empty());
    }

    #[test]
    fn test_toggle_unknown_domain() {
        let mut session = seeded();

        assert!(matches!(
            session.toggle_selected("nope.example"),
            Err(Error::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_select_all_applies_to_visible_page_only() {
        let mut session = seeded();

        let first = session.select_all_visible(true).unwrap();
        assert_eq!(first.len(), 9);
        assert_eq!(session.selected_domains().len(), 9);

        session.set_page(2);
        let second = session.select_all_visible(true).unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(session.selected_domains().len(), 12);

        session.select_all_visible(false).unwrap();
        assert_eq!(session.selected_domains().len(), 9);
    }

    #[test]
    fn test_select_all_state_follows_visible_records() {
        let mut session = seeded();
        let visible = session.select_all_visible(true).unwrap();
        assert_eq!(select_all_state(&mut session), SelectAllState::Checked);

        session.set_page(2);
        assert_eq!(select_all_state(&mut session), SelectAllState::Unchecked);

        session.set_page(1);
        session.toggle_selected(&visible[0]).unwrap();
        assert_eq!(select_all_state(&mut session), SelectAllState::Indeterminate);
    }

    #[test]
    fn test_select_all_requires_identity() {
        let mut session = Session::guest();
        assert!(matches!(
            session.select_all_visible(true),
            Err(Error::NotSignedIn)
        ));
    }

    #[test]
    fn test_set_page_is_clamped() {
        let mut session = seeded();
        session.set_page(40);
        assert_eq!(session.view().page(), 2);
    }

    #[test]
    fn test_begin_scan_clears_records() {
        let mut session = seeded();
        session.set_page(2);

        let generation = session.begin_scan();

        assert_eq!(session.summary().domains, 0);
        assert_eq!(session.view().page(), 1);
        assert_eq!(session.aggregator().generation(), generation);
    }

    #[test]
    fn test_sign_out_clears_records() {
        let mut session = seeded();
        session.sign_out();

        assert!(session.is_guest());
        assert_eq!(session.aggregator().record_count(), 0);
    }

    #[test]
    fn test_sign_in_restores_snapshot() {
        let snapshot = seeded().snapshot();
        let session = Session::signed_in(Identity::new("me@example.com"), Some(snapshot));

        assert_eq!(session.summary().domains, 12);
        assert!(session.record("store0.example").is_some());
    }

    #[test]
    fn test_identity_name_fallback() {
        let identity = Identity::new("me@example.com");
        assert_eq!(identity.name(), "me@example.com");
        assert_eq!(identity.with_display_name("Michael").name(), "Michael");
    }
}
