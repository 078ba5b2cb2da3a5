use serde::{Deserialize, Serialize};

use crate::config::shared::ListenFields;
use crate::config::util::is_false;

// ============================================================================
// Inbound Enum
// ============================================================================

/// Local inbounds the generated configuration listens on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Mixed inbound (SOCKS4/4a/5 and HTTP)
    Mixed(MixedInbound),
    Tun(TunInbound),
}

impl Inbound {
    pub fn tag(&self) -> &str {
        match self {
            Inbound::Mixed(i) => &i.tag,
            Inbound::Tun(i) => &i.tag,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MixedInbound {
    pub tag: String,

    #[serde(flatten)]
    pub listen: ListenFields,

    /// Automatically set system proxy
    #[serde(default, skip_serializing_if = "is_false")]
    pub set_system_proxy: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TunInbound {
    pub tag: String,

    /// IPv4 and IPv6 address prefixes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,

    /// Maximum transmission unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,

    /// Set default route to TUN
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_route: bool,

    /// Enforce strict routing rules
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict_route: bool,

    /// TCP/IP stack: system, gvisor, mixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub sniff: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub sniff_override_destination: bool,
}
