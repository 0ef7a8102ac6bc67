//! Plain-text draft encoding for the Gmail drafts API.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use spamslam_core::OutgoingDraft;

/// Renders the draft as an RFC 5322 message with CRLF line endings.
#[must_use]
pub fn to_rfc5322(draft: &OutgoingDraft) -> String {
    let mut message = String::new();

    let _ = write!(message, "To: {}\r\n", draft.to);
    let _ = write!(message, "Subject: {}\r\n", encode_header(&draft.subject));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: 8bit\r\n");
    message.push_str("\r\n");

    message.push_str(&crlf(&draft.body));
    message
}

/// The `raw` field value: base64url without padding.
#[must_use]
pub fn encode_raw(draft: &OutgoingDraft) -> String {
    URL_SAFE_NO_PAD.encode(to_rfc5322(draft))
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    let value = value.replace(['\r', '\n'], " ");
    if value.is_ascii() {
        value
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(subject: &str, body: &str) -> OutgoingDraft {
        OutgoingDraft {
            to: "privacy@uber.com".into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    #[test]
    fn test_rfc5322_layout() {
        let message = to_rfc5322(&draft("Delete my data", "Hello,\nPlease delete.\r\nThanks"));

        assert!(message.starts_with("To: privacy@uber.com\r\nSubject: Delete my data\r\n"));
        assert!(message.contains("Content-Type: text/plain; charset=\"UTF-8\"\r\n"));
        assert!(message.ends_with("\r\n\r\nHello,\r\nPlease delete.\r\nThanks"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let message = to_rfc5322(&draft("Löschung meiner Daten", ""));
        assert!(message.contains("Subject: =?UTF-8?B?"));
    }

    #[test]
    fn test_header_injection_is_flattened() {
        let message = to_rfc5322(&draft("Hi\r\nBcc: x@evil.com", ""));
        assert!(!message.contains("\r\nBcc:"));
    }

    #[test]
    fn test_raw_is_unpadded_base64url() {
        let raw = encode_raw(&draft("Delete my data?", "body>>>"));

        assert!(!raw.contains('='));
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
        let decoded = URL_SAFE_NO_PAD.decode(raw).unwrap();
        assert!(String::from_utf8(decoded).unwrap().contains("body>>>"));
    }
}
