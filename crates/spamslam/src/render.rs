//! Plain-text rendering of sessions, records and reports.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use spamslam_core::actions::{self, ActionOutcome};
use spamslam_core::{
    ActionKind, ActionReport, DomainRecord, Identity, Rendered, ScanProgress, ScanReport,
    SelectAllState, Summary,
};

/// Header with the headline numbers.
#[must_use]
pub fn summary(identity: Option<&Identity>, summary: &Summary) -> String {
    let who = identity.map_or_else(
        || "Not connected. Run `spamslam connect --token <TOKEN>`.".to_string(),
        |identity| format!("Hi, {} ({})", identity.name(), identity.email),
    );
    format!(
        "{who}\n{} companies · {} emails · {} actioned",
        summary.domains, summary.messages, summary.actioned
    )
}

/// The company grid for one page.
#[must_use]
pub fn grid(rendered: &Rendered<'_>) -> String {
    match rendered {
        Rendered::Guest => "Connect your Gmail to see the companies that email you.".to_string(),
        Rendered::NoMatches { .. } => "No companies match.".to_string(),
        Rendered::Page(page) => {
            let mut out = String::new();
            let select_all = match page.select_all_state() {
                SelectAllState::Unchecked => "[ ]",
                SelectAllState::Indeterminate => "[-]",
                SelectAllState::Checked => "[x]",
            };
            let _ = writeln!(out, "{select_all} select page ({} matching)", page.filtered_count);

            for record in &page.items {
                let _ = writeln!(out, "{}", grid_row(record));
            }

            let buttons: Vec<String> = page
                .page_buttons()
                .iter()
                .map(|button| {
                    if button.active {
                        format!("[{}]", button.number)
                    } else {
                        button.number.to_string()
                    }
                })
                .collect();
            let _ = write!(out, "Page {}", buttons.join(" "));
            out
        }
    }
}

fn grid_row(record: &DomainRecord) -> String {
    let check = if record.is_selected() { "[x]" } else { "[ ]" };
    let tags: Vec<&str> = record.artifacts().keys().map(ActionKind::as_str).collect();
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!("  ({})", tags.join(", "))
    };

    format!(
        "{check} {:<32} {:>5}  last {}{tags}",
        record.domain(),
        record.message_count(),
        date(record.last_seen()),
    )
}

/// Full details for one record.
#[must_use]
pub fn record_details(record: &DomainRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.domain());
    let _ = writeln!(out, "  logo:      {}", record.logo_url());
    let _ = writeln!(out, "  emails:    {}", record.message_count());
    let _ = writeln!(out, "  first:     {}", date(record.first_seen()));
    let _ = writeln!(out, "  last:      {}", date(record.last_seen()));
    let _ = writeln!(out, "  selected:  {}", if record.is_selected() { "yes" } else { "no" });

    let _ = writeln!(out, "  senders:");
    for (address, count) in record.email_counts() {
        let _ = writeln!(out, "    {address} ({count})");
    }

    if !record.sample_subjects().is_empty() {
        let _ = writeln!(out, "  subjects:");
        for subject in record.sample_subjects() {
            let _ = writeln!(out, "    {subject}");
        }
    }

    for (kind, artifact) in record.artifacts() {
        let _ = writeln!(out, "\n{}:", kind.display_name());
        let _ = writeln!(out, "{}", actions::display_text(*kind, artifact));
    }

    out.trim_end().to_string()
}

/// One line of scan progress.
#[must_use]
pub fn progress(progress: &ScanProgress) -> String {
    format!(
        "Scanned {}/{} · {} companies · {} emails",
        progress.processed, progress.total, progress.domains, progress.messages
    )
}

/// Scan outcome.
#[must_use]
pub fn scan_report(report: &ScanReport) -> String {
    if report.superseded {
        return "Scan was superseded by a newer one.".to_string();
    }

    let mut line = format!(
        "Scan complete: {} companies from {} emails",
        report.domains, report.attributed
    );
    if report.failed > 0 {
        let _ = write!(line, " ({} could not be read)", report.failed);
    }
    line
}

/// Per-domain outcome of a bulk action.
#[must_use]
pub fn action_report(report: &ActionReport) -> String {
    let mut out = String::new();
    for (domain, outcome) in &report.outcomes {
        match outcome {
            ActionOutcome::Generated(artifact) => {
                let _ = writeln!(out, "== {domain}: {}", report.kind.display_name());
                let _ = writeln!(out, "{}\n", actions::display_text(report.kind, artifact));
            }
            ActionOutcome::Failed(reason) => {
                let _ = writeln!(out, "!! {domain}: {reason}");
            }
        }
    }
    let _ = write!(
        out,
        "{} generated, {} failed",
        report.generated_count(),
        report.failed_count()
    );
    out
}

fn date(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(|| "-".to_string(), |ts| ts.format("%Y-%m-%d").to_string())
}
