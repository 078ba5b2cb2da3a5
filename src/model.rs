//! Records the generator works from: parsed nodes plus the user's filters,
//! routing rules, rule groups and settings.

use serde::{Deserialize, Serialize};

use crate::config::outbound::{
    Hysteria2Options, Outbound, ServerOutbound, ShadowsocksOptions, TrojanOptions, TuicOptions,
    VLessOptions, VMessOptions,
};
use crate::config::util::{default_true, string_or_vec};

// ============================================================================
// Node
// ============================================================================

/// One proxy endpoint parsed from a share link.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub server: String,
    pub server_port: u16,

    /// ISO 3166-1 alpha-2 code, upper case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(flatten)]
    pub protocol: NodeProtocol,
}

/// Protocol-specific payload of a [`Node`], tagged by `type` on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeProtocol {
    Shadowsocks(ShadowsocksOptions),
    #[serde(rename = "vmess")]
    VMess(VMessOptions),
    Trojan(TrojanOptions),
    #[serde(rename = "vless")]
    VLess(VLessOptions),
    Tuic(TuicOptions),
    Hysteria2(Hysteria2Options),
}

impl Node {
    pub fn new(
        tag: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        protocol: NodeProtocol,
    ) -> Self {
        Self {
            tag: tag.into(),
            server: server.into(),
            server_port,
            country: None,
            protocol,
        }
    }

    /// Protocol identifier as it appears in the `type` field.
    pub fn protocol_name(&self) -> &'static str {
        match self.protocol {
            NodeProtocol::Shadowsocks(_) => "shadowsocks",
            NodeProtocol::VMess(_) => "vmess",
            NodeProtocol::Trojan(_) => "trojan",
            NodeProtocol::VLess(_) => "vless",
            NodeProtocol::Tuic(_) => "tuic",
            NodeProtocol::Hysteria2(_) => "hysteria2",
        }
    }

    fn envelope<T>(&self, options: T) -> ServerOutbound<T> {
        ServerOutbound {
            tag: self.tag.clone(),
            server: self.server.clone(),
            server_port: self.server_port,
            options,
        }
    }
}

impl From<&Node> for Outbound {
    fn from(node: &Node) -> Self {
        match &node.protocol {
            NodeProtocol::Shadowsocks(o) => Outbound::Shadowsocks(node.envelope(o.clone())),
            NodeProtocol::VMess(o) => Outbound::VMess(node.envelope(o.clone())),
            NodeProtocol::Trojan(o) => Outbound::Trojan(node.envelope(o.clone())),
            NodeProtocol::VLess(o) => Outbound::VLess(node.envelope(o.clone())),
            NodeProtocol::Tuic(o) => Outbound::Tuic(node.envelope(o.clone())),
            NodeProtocol::Hysteria2(o) => Outbound::Hysteria2(node.envelope(o.clone())),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Selector,
    #[default]
    UrlTest,
}

/// Health check settings for a urltest filter group. Unset fields fall back to the
/// generator defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlTestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

/// Selects a subset of nodes into a named group.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: FilterMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urltest: Option<UrlTestConfig>,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub include_countries: Vec<String>,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub exclude_countries: Vec<String>,

    /// Keywords the lowercased tag must contain (any of)
    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            mode: FilterMode::default(),
            urltest: None,
            include_countries: Vec::new(),
            exclude_countries: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    DomainSuffix,
    DomainKeyword,
    Domain,
    IpCidr,
    Port,
    Geosite,
    Geoip,
}

/// Custom routing rule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Lower sorts first
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(rename = "type")]
    pub rule_type: RuleType,

    #[serde(deserialize_with = "string_or_vec")]
    pub values: Vec<String>,

    pub outbound: String,
}

/// Curated routing bundle: a set of geosite/geoip categories routed through
/// their own selector.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RuleGroup {
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default choice of the group's selector
    pub outbound: String,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub site_rules: Vec<String>,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub ip_rules: Vec<String>,
}

// ============================================================================
// Settings
// ============================================================================

pub const DEFAULT_RULE_SET_BASE_URL: &str =
    "https://raw.githubusercontent.com/lyc8503/sing-box-rules/rule-set-geosite";

/// Process-wide settings consumed by the generator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// sing-box binary, informational for callers that supervise it
    pub singbox_path: String,
    /// Where `apply` writes the generated configuration
    pub config_path: String,
    pub mixed_port: u16,
    pub tun_enabled: bool,
    pub proxy_dns: String,
    pub direct_dns: String,
    /// `0` disables the Clash API and cache file
    pub clash_api_port: u16,
    pub clash_api_secret: String,
    pub clash_ui_path: String,
    pub final_outbound: String,
    pub rule_set_base_url: String,
    /// Minutes between subscription refreshes, `0` disables
    pub subscription_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            singbox_path: "sing-box".to_string(),
            config_path: "config.json".to_string(),
            mixed_port: 2080,
            tun_enabled: false,
            proxy_dns: "https://1.1.1.1/dns-query".to_string(),
            direct_dns: "https://dns.alidns.com/dns-query".to_string(),
            clash_api_port: 9091,
            clash_api_secret: String::new(),
            clash_ui_path: "zashboard".to_string(),
            final_outbound: "Proxy".to_string(),
            rule_set_base_url: DEFAULT_RULE_SET_BASE_URL.to_string(),
            subscription_interval: 60,
        }
    }
}
