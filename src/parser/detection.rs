//! Subscription body detection
//!
//! Providers serve either a plain list of share links or the same list
//! wrapped in one base64 blob.

use std::fmt;

use tracing::debug;

use super::base64::decode_base64;

/// Detected subscription content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionType {
    /// One share link per line
    PlainUriList,
    /// Base64-wrapped link list
    Base64UriList,
    Unknown,
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionType::PlainUriList => write!(f, "Plain URI List"),
            SubscriptionType::Base64UriList => write!(f, "Base64 URI List"),
            SubscriptionType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Detects the type of subscription content
pub fn detect_subscription_type(content: &str) -> SubscriptionType {
    let trimmed = content.trim();
    let preview: String = trimmed.chars().take(100).collect();
    debug!(
        "Detecting subscription type, content length: {} bytes, preview: {:?}...",
        content.len(),
        preview
    );

    if is_plain_uri_list(trimmed) {
        return SubscriptionType::PlainUriList;
    }
    if is_base64_content(trimmed) {
        return SubscriptionType::Base64UriList;
    }

    debug!("Unable to detect subscription format");
    SubscriptionType::Unknown
}

/// First meaningful line looks like `scheme://...`
pub fn is_plain_uri_list(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(is_uri_line)
}

/// `scheme://` with an alphanumeric scheme (`+`, `-` and `.` allowed).
pub fn is_uri_line(line: &str) -> bool {
    line.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Whole body is base64 whose decoded text contains at least one link.
pub fn is_base64_content(content: &str) -> bool {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() < 4 {
        return false;
    }

    let alphabet_ok = cleaned
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '-' | '_'));
    if !alphabet_ok {
        return false;
    }

    decode_base64(&cleaned).is_ok_and(|decoded| decoded.lines().any(|l| is_uri_line(l.trim())))
}
