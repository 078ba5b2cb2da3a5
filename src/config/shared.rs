use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

// ============================================================================
// Listen Fields
// ============================================================================

/// Listen fields shared by local inbounds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenFields {
    /// Listen address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    /// Listen port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,

    /// Enable protocol sniffing
    #[serde(default, skip_serializing_if = "is_false")]
    pub sniff: bool,

    /// Replace the connection destination with the sniffed domain
    #[serde(default, skip_serializing_if = "is_false")]
    pub sniff_override_destination: bool,
}

impl ListenFields {
    /// Sniffing listener, the shape every local inbound uses.
    pub fn sniffing(listen: Option<String>, listen_port: Option<u16>) -> Self {
        Self {
            listen,
            listen_port,
            sniff: true,
            sniff_override_destination: true,
        }
    }
}

// ============================================================================
// TLS Fields
// ============================================================================

/// Client side TLS settings attached to proxy outbounds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundTlsConfig {
    /// Enable TLS
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Do not send server name in ClientHello
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_sni: bool,

    /// Server name for verification and SNI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    /// Accept any server certificate
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utls: Option<UtlsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<OutboundRealityConfig>,
}

impl OutboundTlsConfig {
    /// TLS switched on with no further options.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

/// uTLS configuration for ClientHello fingerprinting.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UtlsConfig {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// chrome, firefox, edge, safari, 360, qq, ios, android, random, randomized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl UtlsConfig {
    pub fn with_fingerprint(fingerprint: impl Into<String>) -> Self {
        Self {
            enabled: true,
            fingerprint: Some(fingerprint.into()),
        }
    }
}

/// Reality configuration for outbound (client).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundRealityConfig {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Public key (generated by `sing-box generate reality-keypair`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Short ID (hex string, 0-8 digits)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_tls_default_serializes_empty() {
        let tls = OutboundTlsConfig::default();
        let json = serde_json::to_string(&tls).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_outbound_tls_with_values() {
        let tls = OutboundTlsConfig {
            enabled: true,
            server_name: Some("example.com".to_string()),
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_string(&tls).unwrap();
        assert!(json.contains(r#""enabled":true"#));
        assert!(json.contains(r#""server_name":"example.com""#));
        assert!(json.contains(r#""alpn":["h2","http/1.1"]"#));
        assert!(!json.contains("insecure"));
    }

    #[test]
    fn test_reality_with_utls() {
        let tls = OutboundTlsConfig {
            enabled: true,
            utls: Some(UtlsConfig::with_fingerprint("chrome")),
            reality: Some(OutboundRealityConfig {
                enabled: true,
                public_key: Some("pbk".to_string()),
                short_id: Some("ab".to_string()),
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&tls).unwrap();
        assert!(json.contains(r#""utls":{"enabled":true,"fingerprint":"chrome"}"#));
        assert!(json.contains(r#""reality":{"enabled":true,"public_key":"pbk","short_id":"ab"}"#));
    }

    #[test]
    fn test_listen_fields_default_serializes_empty() {
        let listen = ListenFields::default();
        assert_eq!(serde_json::to_string(&listen).unwrap(), "{}");
    }
}
