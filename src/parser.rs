//! Subscription and share-link parsing
//!
//! - Detecting whether a subscription body is plain or base64-wrapped
//! - Decoding share links (ss://, vmess://, vless://, trojan://, tuic://,
//!   hysteria2://) into [`Node`]s through the [`ProtocolRegistry`]
//! - Batch import that keeps going past broken lines

pub mod base64;
pub mod detection;
pub mod params;
pub mod protocols;

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::model::Node;

pub use detection::{SubscriptionType, detect_subscription_type};
pub use protocols::{ProtocolParser, ProtocolRegistry};

/// One line of a subscription body that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number in the decoded body
    pub line: usize,
    pub uri: String,
    pub error: ParseError,
}

/// Outcome of a batch import. Both lists keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub nodes: Vec<Node>,
    pub errors: Vec<LineError>,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.nodes.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// Parses a single share link.
pub fn parse_uri(uri: &str) -> Result<Node, ParseError> {
    ProtocolRegistry::new().parse_uri(uri)
}

/// Unwraps a base64 subscription body; plain bodies pass through.
pub fn decode_subscription_body(body: &str) -> Result<String, ParseError> {
    match detect_subscription_type(body) {
        SubscriptionType::Base64UriList => base64::decode_base64(body.trim()),
        _ => Ok(body.to_string()),
    }
}

/// Imports every link in a subscription body.
pub fn import_subscription(body: &str) -> ImportReport {
    import_subscription_with_registry(body, &ProtocolRegistry::new())
}

/// Imports a subscription body using the given registry
///
/// Blank lines and `#` comments are skipped. A line that fails to parse is
/// recorded in [`ImportReport::errors`] and the rest of the body is still
/// processed.
pub fn import_subscription_with_registry(body: &str, registry: &ProtocolRegistry) -> ImportReport {
    let subscription_type = detect_subscription_type(body);
    debug!("Detected subscription type: {}", subscription_type);

    let decoded = match decode_subscription_body(body) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Failed to unwrap subscription body: {}", e);
            body.to_string()
        }
    };

    let mut report = ImportReport::default();
    for (index, line) in decoded.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match registry.parse_uri(line) {
            Ok(node) => report.nodes.push(node),
            Err(error) => {
                warn!("Line {}: failed to parse URI: {}", index + 1, error);
                report.errors.push(LineError {
                    line: index + 1,
                    uri: line.to_string(),
                    error,
                });
            }
        }
    }

    debug!(
        "Subscription import complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    report
}
