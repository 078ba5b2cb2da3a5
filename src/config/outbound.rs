use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::shared::OutboundTlsConfig;
use crate::config::util::{is_false, is_zero_u32};

// ============================================================================
// Outbound Enum
// ============================================================================

/// Outbound configuration enum
///
/// Covers the built-in outbounds the generated config always carries, the
/// proxy protocols a subscription can contain, and the two group types.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Direct(DirectOutbound),
    Block(BlockOutbound),
    Dns(DnsOutbound),
    Shadowsocks(ServerOutbound<ShadowsocksOptions>),
    #[serde(rename = "vmess")]
    VMess(ServerOutbound<VMessOptions>),
    Trojan(ServerOutbound<TrojanOptions>),
    #[serde(rename = "vless")]
    VLess(ServerOutbound<VLessOptions>),
    Tuic(ServerOutbound<TuicOptions>),
    Hysteria2(ServerOutbound<Hysteria2Options>),
    Selector(SelectorOutbound),
    #[serde(rename = "urltest")]
    UrlTest(UrlTestOutbound),
}

impl Outbound {
    pub fn tag(&self) -> &str {
        match self {
            Outbound::Direct(o) => &o.tag,
            Outbound::Block(o) => &o.tag,
            Outbound::Dns(o) => &o.tag,
            Outbound::Shadowsocks(o) => &o.tag,
            Outbound::VMess(o) => &o.tag,
            Outbound::Trojan(o) => &o.tag,
            Outbound::VLess(o) => &o.tag,
            Outbound::Tuic(o) => &o.tag,
            Outbound::Hysteria2(o) => &o.tag,
            Outbound::Selector(o) => &o.tag,
            Outbound::UrlTest(o) => &o.tag,
        }
    }
}

/// Tag and server address shared by every proxy outbound, with the
/// protocol-specific options flattened next to them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerOutbound<T> {
    pub tag: String,
    pub server: String,
    pub server_port: u16,
    #[serde(flatten)]
    pub options: T,
}

// ============================================================================
// V2Ray Transport
// ============================================================================

/// V2Ray transport configuration for outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum V2RayTransport {
    Http(HttpTransport),
    #[serde(rename = "ws")]
    WebSocket(WebSocketTransport),
    Quic(QuicTransport),
    #[serde(rename = "grpc")]
    Grpc(GrpcTransport),
    #[serde(rename = "httpupgrade")]
    HttpUpgrade(HttpUpgradeTransport),
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpTransport {
    /// Host domains
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct WebSocketTransport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Extra headers, `Host` in practice
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct QuicTransport {}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GrpcTransport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpUpgradeTransport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ============================================================================
// Built-in Outbounds
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DirectOutbound {
    pub tag: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BlockOutbound {
    pub tag: String,
}

/// DNS outbound, the target of the DNS hijack route rule
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DnsOutbound {
    pub tag: String,
}

// ============================================================================
// Proxy Protocol Options
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShadowsocksOptions {
    /// Encryption method (required)
    pub method: String,

    pub password: String,

    /// SIP003 plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// SIP003 plugin options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VMessOptions {
    pub uuid: String,

    /// auto, none, zero, aes-128-gcm, chacha20-poly1305
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,

    /// Alter ID (0 = AEAD)
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub alter_id: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<V2RayTransport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrojanOptions {
    pub password: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<V2RayTransport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VLessOptions {
    pub uuid: String,

    /// VLESS flow, e.g. xtls-rprx-vision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,

    /// UDP packet encoding: packetaddr, xudp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<V2RayTransport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TuicOptions {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// cubic, new_reno, bbr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_control: Option<String>,

    /// native, quic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub zero_rtt_handshake: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Hysteria2Options {
    pub password: String,

    /// Port hopping ranges, `20000:30000`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_ports: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hop_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<Hysteria2Obfs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Hysteria2Obfs {
    /// Obfuscation type (only "salamander")
    #[serde(rename = "type")]
    pub obfs_type: String,

    pub password: String,
}

// ============================================================================
// Group Outbounds
// ============================================================================

/// Selector outbound (manual selection)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorOutbound {
    pub tag: String,

    /// Outbound tags to select from (required)
    #[serde(default)]
    pub outbounds: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub interrupt_exist_connections: bool,
}

/// URLTest outbound (automatic selection by latency)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlTestOutbound {
    pub tag: String,

    /// Outbound tags to test (required)
    #[serde(default)]
    pub outbounds: Vec<String>,

    /// Test URL (default: https://www.gstatic.com/generate_204)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Test interval (default: 3m)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Tolerance in milliseconds
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tolerance: u32,

    #[serde(default, skip_serializing_if = "is_false")]
    pub interrupt_exist_connections: bool,
}

// ============================================================================
// Builder Implementations
// ============================================================================

impl DirectOutbound {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl BlockOutbound {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl DnsOutbound {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl SelectorOutbound {
    pub fn new(tag: impl Into<String>, outbounds: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            outbounds,
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl UrlTestOutbound {
    pub fn new(tag: impl Into<String>, outbounds: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            outbounds,
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_enum_builtins() {
        let json = serde_json::to_string(&Outbound::Direct(DirectOutbound::new("DIRECT"))).unwrap();
        assert_eq!(json, r#"{"type":"direct","tag":"DIRECT"}"#);

        let json = serde_json::to_string(&Outbound::Block(BlockOutbound::new("REJECT"))).unwrap();
        assert_eq!(json, r#"{"type":"block","tag":"REJECT"}"#);

        let json = serde_json::to_string(&Outbound::Dns(DnsOutbound::new("dns-out"))).unwrap();
        assert_eq!(json, r#"{"type":"dns","tag":"dns-out"}"#);
    }

    #[test]
    fn test_server_outbound_flattens_options() {
        let outbound = Outbound::Shadowsocks(ServerOutbound {
            tag: "node".to_string(),
            server: "1.2.3.4".to_string(),
            server_port: 8388,
            options: ShadowsocksOptions {
                method: "aes-256-gcm".to_string(),
                password: "secret".to_string(),
                ..Default::default()
            },
        });
        let json = serde_json::to_string(&outbound).unwrap();
        assert_eq!(
            json,
            r#"{"type":"shadowsocks","tag":"node","server":"1.2.3.4","server_port":8388,"method":"aes-256-gcm","password":"secret"}"#
        );

        let parsed: Outbound = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outbound);
    }

    #[test]
    fn test_transport_serialization() {
        let mut headers = BTreeMap::new();
        headers.insert("Host".to_string(), "cdn.example.com".to_string());
        let ws = V2RayTransport::WebSocket(WebSocketTransport {
            path: Some("/ws".to_string()),
            headers,
        });
        let json = serde_json::to_string(&ws).unwrap();
        assert_eq!(json, r#"{"type":"ws","path":"/ws","headers":{"Host":"cdn.example.com"}}"#);

        let grpc = V2RayTransport::Grpc(GrpcTransport {
            service_name: Some("svc".to_string()),
        });
        let json = serde_json::to_string(&grpc).unwrap();
        assert_eq!(json, r#"{"type":"grpc","service_name":"svc"}"#);
    }

    #[test]
    fn test_selector_outbound() {
        let selector = SelectorOutbound::new("Proxy", vec!["Auto".to_string(), "node".to_string()])
            .with_default("Auto");
        let json = serde_json::to_string(&Outbound::Selector(selector)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"selector","tag":"Proxy","outbounds":["Auto","node"],"default":"Auto"}"#
        );
    }

    #[test]
    fn test_urltest_outbound() {
        let urltest = UrlTestOutbound::new("Auto", vec!["a".to_string()])
            .with_url("https://www.gstatic.com/generate_204")
            .with_interval("5m")
            .with_tolerance(50);
        let outbound = Outbound::UrlTest(urltest);
        assert_eq!(outbound.tag(), "Auto");

        let json = serde_json::to_string(&outbound).unwrap();
        assert!(json.starts_with(r#"{"type":"urltest","tag":"Auto""#));
        assert!(json.contains(r#""interval":"5m""#));
        assert!(json.contains(r#""tolerance":50"#));
    }

    #[test]
    fn test_hysteria2_obfs_type_renamed() {
        let obfs = Hysteria2Obfs {
            obfs_type: "salamander".to_string(),
            password: "pw".to_string(),
        };
        let json = serde_json::to_string(&obfs).unwrap();
        assert_eq!(json, r#"{"type":"salamander","password":"pw"}"#);
    }
}
