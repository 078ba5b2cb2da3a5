//! Route configuration types for sing-box: rules, remote rule sets and the
//! final fallback outbound.

use serde::{Deserialize, Serialize};

use crate::config::util::{is_false, string_or_vec, u16_or_vec};

// ============================================================================
// Route Configuration
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RouteRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<RuleSet>,

    /// Default outbound tag (first outbound used if empty)
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "final")]
    pub final_outbound: Option<String>,

    /// Bind outbound connections to default NIC (Linux/Windows/macOS)
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_detect_interface: bool,
}

// ============================================================================
// Route Rules
// ============================================================================

/// A route rule that matches connections and names the outbound they use.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteRule {
    /// Match sniffed protocol
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub protocol: Vec<String>,

    /// Match full domain
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub domain: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub domain_suffix: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub domain_keyword: Vec<String>,

    /// Match destination IP CIDR
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub ip_cidr: Vec<String>,

    /// Match destination port
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "u16_or_vec")]
    pub port: Vec<u16>,

    /// Match destination port range, `1000:2000`
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub port_range: Vec<String>,

    /// Match rule set tags
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_vec")]
    pub rule_set: Vec<String>,

    /// Target outbound tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<String>,
}

impl RouteRule {
    /// Rule with no match conditions yet, routed to `outbound`.
    pub fn to_outbound(outbound: impl Into<String>) -> Self {
        Self {
            outbound: Some(outbound.into()),
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol.push(protocol.into());
        self
    }

    pub fn with_rule_set(mut self, tags: Vec<String>) -> Self {
        self.rule_set = tags;
        self
    }

    /// True when no match field is set; sing-box treats such a rule as
    /// matching everything.
    pub fn has_no_conditions(&self) -> bool {
        self.protocol.is_empty()
            && self.domain.is_empty()
            && self.domain_suffix.is_empty()
            && self.domain_keyword.is_empty()
            && self.ip_cidr.is_empty()
            && self.port.is_empty()
            && self.port_range.is_empty()
            && self.rule_set.is_empty()
    }
}

// ============================================================================
// Rule Sets
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleSet {
    Remote(RemoteRuleSet),
}

impl RuleSet {
    pub fn tag(&self) -> &str {
        match self {
            RuleSet::Remote(r) => &r.tag,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteRuleSet {
    /// Tag of the rule set (required)
    pub tag: String,

    /// Format of the rule set file (source or binary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RuleSetFormat>,

    /// Download URL of the rule set (required)
    pub url: String,

    /// Outbound tag for downloading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_detour: Option<String>,

    /// Update interval (default: 1d)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<String>,
}

impl RemoteRuleSet {
    pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: RuleSetFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_download_detour(mut self, detour: impl Into<String>) -> Self {
        self.download_detour = Some(detour.into());
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetFormat {
    Source,
    Binary,
}
