//! VMess protocol parser
//!
//! VMess links are base64-encoded JSON:
//! `vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, ... })`

use serde::Deserialize;
use tracing::trace;

use crate::config::outbound::VMessOptions;
use crate::error::ParseError;
use crate::model::{Node, NodeProtocol};
use crate::parser::base64::decode_base64;
use crate::parser::params::{QueryParams, build_tls, build_transport};

use super::{ProtocolParser, default_tag};

pub struct VMessParser;

/// Link payload. Numeric fields show up both as numbers and as strings.
#[derive(Deserialize, Debug)]
struct VMessJson {
    #[serde(default)]
    ps: String,
    /// Missing address fields and id are caught by the checks in `parse`
    #[serde(default)]
    add: String,
    #[serde(default, deserialize_with = "deserialize_port")]
    port: u16,
    #[serde(default)]
    id: String,
    #[serde(default, deserialize_with = "deserialize_option_u32")]
    aid: Option<u32>,
    #[serde(default)]
    scy: Option<String>,
    /// Transport: tcp, ws, h2, grpc, quic, httpupgrade
    #[serde(default)]
    net: Option<String>,
    #[serde(default)]
    tls: Option<String>,
    #[serde(default)]
    sni: Option<String>,
    #[serde(default)]
    alpn: Option<String>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default, rename = "serviceName")]
    service_name: Option<String>,
}

impl VMessJson {
    /// Re-keys the JSON fields the way the query-string protocols spell
    /// them, so TLS and transport share one code path.
    fn to_params(&self) -> QueryParams {
        let fields = [
            ("type", &self.net),
            ("host", &self.host),
            ("path", &self.path),
            ("serviceName", &self.service_name),
            ("sni", &self.sni),
            ("alpn", &self.alpn),
            ("fp", &self.fp),
        ];
        QueryParams::from_pairs(
            fields
                .into_iter()
                .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone()))),
        )
    }
}

impl ProtocolParser for VMessParser {
    fn protocol(&self) -> &'static str {
        "vmess"
    }

    fn parse(&self, uri: &str) -> Result<Node, ParseError> {
        trace!("Parsing VMess URI");
        let encoded = uri
            .trim()
            .strip_prefix("vmess://")
            .ok_or_else(|| ParseError::MalformedUri("expected vmess:// scheme".to_string()))?;

        let decoded = decode_base64(encoded)?;
        let json: VMessJson = serde_json::from_str(&decoded)
            .map_err(|e| ParseError::MalformedUri(format!("invalid VMess JSON: {}", e)))?;

        trace!(
            "VMess config: server={}:{}, net={:?}, tls={:?}",
            json.add, json.port, json.net, json.tls
        );

        if json.add.is_empty() || json.port == 0 {
            return Err(ParseError::MalformedAddress(format!("{}:{}", json.add, json.port)));
        }
        if json.id.is_empty() {
            return Err(ParseError::MissingCredential("uuid"));
        }

        let params = json.to_params();
        let security = if json.tls.as_deref() == Some("tls") {
            "tls"
        } else {
            "none"
        };
        let tls = build_tls(&params, security);
        let transport = build_transport(&params);

        Ok(Node::new(
            default_tag(json.ps, &json.add, json.port),
            json.add,
            json.port,
            NodeProtocol::VMess(VMessOptions {
                uuid: json.id,
                security: json
                    .scy
                    .filter(|s| !s.is_empty())
                    .or_else(|| Some("auto".to_string())),
                alter_id: json.aid.unwrap_or(0),
                tls,
                transport,
            }),
        ))
    }
}

// ============================================================================
// Deserialization Helpers
// ============================================================================

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn deserialize_option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U32Value {
        Number(u32),
        String(String),
    }

    match Option::<U32Value>::deserialize(deserializer)? {
        Some(U32Value::Number(n)) => Ok(Some(n)),
        Some(U32Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(U32Value::String(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::outbound::V2RayTransport;
    use crate::config::shared::UtlsConfig;
    use crate::parser::base64::encode_base64;

    fn vmess_uri(json: &str) -> String {
        format!("vmess://{}", encode_base64(json))
    }

    fn options(node: Node) -> VMessOptions {
        if let NodeProtocol::VMess(vmess) = node.protocol {
            vmess
        } else {
            panic!("Expected VMess node");
        }
    }

    #[test]
    fn test_vmess_basic() {
        let uri = vmess_uri(
            r#"{"v":"2","ps":"test-node","add":"example.com","port":443,"id":"uuid-here","aid":0}"#,
        );
        let node = VMessParser.parse(&uri).unwrap();
        assert_eq!(node.tag, "test-node");
        assert_eq!(node.server, "example.com");
        assert_eq!(node.server_port, 443);
        assert_eq!(node.protocol_name(), "vmess");

        let vmess = options(node);
        assert_eq!(vmess.uuid, "uuid-here");
        assert_eq!(vmess.alter_id, 0);
        assert_eq!(vmess.security.as_deref(), Some("auto"));
        assert!(vmess.tls.is_none());
        assert!(vmess.transport.is_none());
    }

    #[test]
    fn test_vmess_string_numbers_and_websocket() {
        let uri = vmess_uri(
            r#"{"v":"2","ps":"ws-node","add":"example.com","port":"443","id":"uuid","aid":"64","scy":"aes-128-gcm","net":"ws","path":"/ws","host":"ws.example.com","tls":"tls","sni":"example.com"}"#,
        );
        let vmess = options(VMessParser.parse(&uri).unwrap());
        assert_eq!(vmess.alter_id, 64);
        assert_eq!(vmess.security.as_deref(), Some("aes-128-gcm"));

        let tls = vmess.tls.unwrap();
        assert_eq!(tls.server_name.as_deref(), Some("example.com"));

        if let Some(V2RayTransport::WebSocket(ws)) = vmess.transport {
            assert_eq!(ws.path.as_deref(), Some("/ws"));
            assert_eq!(ws.headers.get("Host").map(String::as_str), Some("ws.example.com"));
        } else {
            panic!("Expected WebSocket transport");
        }
    }

    #[test]
    fn test_vmess_with_grpc_and_fingerprint() {
        let uri = vmess_uri(
            r#"{"ps":"grpc-node","add":"example.com","port":443,"id":"uuid","net":"grpc","serviceName":"myservice","tls":"tls","fp":"chrome","aid":""}"#,
        );
        let vmess = options(VMessParser.parse(&uri).unwrap());
        assert_eq!(vmess.alter_id, 0);
        assert_eq!(
            vmess.tls.unwrap().utls,
            Some(UtlsConfig::with_fingerprint("chrome"))
        );
        if let Some(V2RayTransport::Grpc(grpc)) = vmess.transport {
            assert_eq!(grpc.service_name.as_deref(), Some("myservice"));
        } else {
            panic!("Expected gRPC transport");
        }
    }

    #[test]
    fn test_vmess_no_name() {
        let uri = vmess_uri(r#"{"add":"1.2.3.4","port":10086,"id":"uuid"}"#);
        let node = VMessParser.parse(&uri).unwrap();
        assert_eq!(node.tag, "1.2.3.4:10086");
    }

    #[test]
    fn test_vmess_errors() {
        assert_eq!(
            VMessParser.parse("vmess://!!!"),
            Err(ParseError::Base64Decode)
        );
        assert!(matches!(
            VMessParser.parse(&vmess_uri("not json")),
            Err(ParseError::MalformedUri(_))
        ));
        assert_eq!(
            VMessParser.parse(&vmess_uri(r#"{"add":"h","port":1,"id":""}"#)),
            Err(ParseError::MissingCredential("uuid"))
        );
        assert!(matches!(
            VMessParser.parse(&vmess_uri(r#"{"add":"","port":1,"id":"u"}"#)),
            Err(ParseError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_vmess_missing_fields_report_their_kind() {
        assert_eq!(
            VMessParser.parse(&vmess_uri(r#"{"add":"h","port":443}"#)),
            Err(ParseError::MissingCredential("uuid"))
        );
        assert!(matches!(
            VMessParser.parse(&vmess_uri(r#"{"port":443,"id":"u"}"#)),
            Err(ParseError::MalformedAddress(_))
        ));
        assert!(matches!(
            VMessParser.parse(&vmess_uri(r#"{"add":"h","id":"u"}"#)),
            Err(ParseError::MalformedAddress(_))
        ));
    }
}
