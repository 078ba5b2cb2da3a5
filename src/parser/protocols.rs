//! Protocol parsers module
//!
//! Each parser implements [`ProtocolParser`] and turns one share link into a
//! [`Node`]. [`ProtocolRegistry`] dispatches on the URI scheme.

mod hysteria2;
mod shadowsocks;
mod trojan;
mod tuic;
mod vless;
mod vmess;

pub use hysteria2::Hysteria2Parser;
pub use shadowsocks::ShadowsocksParser;
pub use trojan::TrojanParser;
pub use tuic::TuicParser;
pub use vless::VLessParser;
pub use vmess::VMessParser;

use tracing::debug;

use crate::country::detect_country;
use crate::error::ParseError;
use crate::model::Node;

/// Trait for parsing individual protocol URIs
pub trait ProtocolParser: Send + Sync {
    /// Canonical protocol name of the nodes this parser produces
    fn protocol(&self) -> &'static str;

    /// Parses a URI string into a node
    fn parse(&self, uri: &str) -> Result<Node, ParseError>;
}

/// Falls back to `server:port` when the link carries no name.
pub(crate) fn default_tag(name: String, server: &str, port: u16) -> String {
    if name.is_empty() {
        format!("{}:{}", server, port)
    } else {
        name
    }
}

static PARSERS: [(&str, &dyn ProtocolParser); 7] = [
    ("ss", &ShadowsocksParser),
    ("vmess", &VMessParser),
    ("vless", &VLessParser),
    ("trojan", &TrojanParser),
    ("tuic", &TuicParser),
    ("hysteria2", &Hysteria2Parser),
    ("hy2", &Hysteria2Parser),
];

/// Scheme-keyed dispatch over the built-in parsers
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolRegistry;

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Returns the parser registered for `scheme`, if any
    pub fn get(&self, scheme: &str) -> Option<&'static dyn ProtocolParser> {
        PARSERS
            .iter()
            .find(|(name, _)| *name == scheme)
            .map(|(_, parser)| *parser)
    }

    /// Parses a URI using the appropriate parser
    ///
    /// Nodes whose tag names a known region get their country filled in.
    pub fn parse_uri(&self, uri: &str) -> Result<Node, ParseError> {
        let uri = uri.trim();
        let scheme = extract_scheme(uri)?;
        let parser = self
            .get(scheme)
            .ok_or_else(|| ParseError::UnsupportedProtocol(scheme.to_string()))?;

        let mut node = parser.parse(uri).inspect_err(|e| {
            debug!("Failed to parse {} URI: {}", scheme, e);
        })?;
        if node.country.is_none() {
            node.country = detect_country(&node.tag).map(str::to_string);
        }
        debug!(
            "Parsed {} URI -> node '{}' ({})",
            scheme,
            node.tag,
            node.country.as_deref().unwrap_or("-")
        );
        Ok(node)
    }
}

/// Extracts the scheme from a URI
pub fn extract_scheme(uri: &str) -> Result<&str, ParseError> {
    match uri.split_once("://") {
        Some((scheme, _)) if !scheme.is_empty() => Ok(scheme),
        _ => Err(ParseError::MalformedUri(format!(
            "missing scheme in `{}`",
            uri
        ))),
    }
}
