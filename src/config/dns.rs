use serde::{Deserialize, Serialize};

use crate::config::util::{is_false, string_or_vec};

/// DNS configuration for sing-box
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Dns {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<DnsServer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<DnsRule>,

    /// Default DNS server tag. The first server will be used if empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#final: Option<String>,

    /// Make each DNS server's cache independent
    #[serde(default, skip_serializing_if = "is_false")]
    pub independent_cache: bool,
}

/// Address-style DNS server: `https://1.1.1.1/dns-query`, `223.5.5.5`,
/// `rcode://success` and friends.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsServer {
    pub tag: String,

    pub address: String,

    /// Tag of another server to resolve domain names in the address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_resolver: Option<String>,

    /// Tag of an outbound for connecting to the DNS server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour: Option<String>,
}

impl DnsServer {
    pub fn new(tag: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.address_resolver = Some(resolver.into());
        self
    }

    pub fn with_detour(mut self, detour: impl Into<String>) -> Self {
        self.detour = Some(detour.into());
        self
    }
}

/// DNS rule routing queries that match a rule set to a server.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsRule {
    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<String>,

    #[serde(default, deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub outbound: Vec<String>,

    /// Target server tag
    pub server: String,
}

impl DnsRule {
    pub fn rule_set(rule_set: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            rule_set: vec![rule_set.into()],
            server: server.into(),
            ..Default::default()
        }
    }
}
