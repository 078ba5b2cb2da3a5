//! Hysteria2 protocol parser
//!
//! Formats:
//! - `hysteria2://password@host:port?params#tag`
//! - `hysteria2://host:port?auth=password&params#tag`
//!
//! `hy2://` is accepted as an alias.

use tracing::{trace, warn};

use crate::config::outbound::{Hysteria2Obfs, Hysteria2Options};
use crate::error::ParseError;
use crate::model::{Node, NodeProtocol};
use crate::parser::params::{
    QueryParams, build_tls, parse_server_info, parse_url_params, percent_decode, split_list,
    split_user_info,
};

use super::{ProtocolParser, default_tag};

const DEFAULT_OBFS: &str = "salamander";

pub struct Hysteria2Parser;

impl ProtocolParser for Hysteria2Parser {
    fn protocol(&self) -> &'static str {
        "hysteria2"
    }

    fn parse(&self, uri: &str) -> Result<Node, ParseError> {
        trace!("Parsing Hysteria2 URI");
        let parts = parse_url_params(uri)?;
        let params = &parts.params;

        let (password, server_part) = match split_user_info(&parts.address) {
            Some((user_info, server_part)) => (percent_decode(user_info), server_part),
            None => (
                params.get_string("auth").unwrap_or_default(),
                parts.address.as_str(),
            ),
        };
        let (server, server_port) = parse_server_info(server_part)?;
        if password.is_empty() {
            return Err(ParseError::MissingCredential("password"));
        }

        let obfs = params.get("obfs-password").map(|obfs_password| Hysteria2Obfs {
            obfs_type: params.get("obfs").unwrap_or(DEFAULT_OBFS).to_string(),
            password: obfs_password.to_string(),
        });

        Ok(Node::new(
            default_tag(parts.name, &server, server_port),
            server,
            server_port,
            NodeProtocol::Hysteria2(Hysteria2Options {
                password,
                server_ports: params.get("mport").map(port_ranges).unwrap_or_default(),
                hop_interval: params.get_string("hop-interval"),
                up_mbps: bandwidth(params, "upmbps", "up"),
                down_mbps: bandwidth(params, "downmbps", "down"),
                obfs,
                tls: build_tls(params, "tls"),
            }),
        ))
    }
}

/// `upmbps=100` wins; otherwise a free-form `up=100 Mbps` contributes its
/// leading number.
fn bandwidth(params: &QueryParams, mbps_key: &str, text_key: &str) -> Option<u32> {
    if let Some(mbps) = params.get(mbps_key) {
        return mbps.trim().parse().ok();
    }
    let text = params.get(text_key)?;
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let value = digits.parse().ok();
    if value.is_none() {
        warn!("Ignoring unparsable Hysteria2 bandwidth {}={}", text_key, text);
    }
    value
}

/// `mport=443,20000-30000` becomes `["443:443", "20000:30000"]`.
fn port_ranges(mport: &str) -> Vec<String> {
    split_list(mport)
        .into_iter()
        .map(|range| {
            if let Some((start, end)) = range.split_once('-') {
                format!("{}:{}", start.trim(), end.trim())
            } else if range.contains(':') {
                range
            } else {
                format!("{range}:{range}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(node: Node) -> Hysteria2Options {
        if let NodeProtocol::Hysteria2(hy2) = node.protocol {
            hy2
        } else {
            panic!("Expected Hysteria2 node");
        }
    }

    #[test]
    fn test_hysteria2_password_in_userinfo() {
        let uri = "hysteria2://letmein@example.com:443?sni=real.example.com&insecure=1&obfs-password=gawrgura#hy2-node";
        let node = Hysteria2Parser.parse(uri).unwrap();
        assert_eq!(node.tag, "hy2-node");
        assert_eq!(node.protocol_name(), "hysteria2");

        let hy2 = options(node);
        assert_eq!(hy2.password, "letmein");
        let tls = hy2.tls.unwrap();
        assert!(tls.enabled);
        assert!(tls.insecure);
        assert_eq!(tls.server_name.as_deref(), Some("real.example.com"));
        assert_eq!(
            hy2.obfs,
            Some(Hysteria2Obfs {
                obfs_type: "salamander".to_string(),
                password: "gawrgura".to_string(),
            })
        );
    }

    #[test]
    fn test_hysteria2_auth_param() {
        let node = Hysteria2Parser
            .parse("hy2://example.com:8443?auth=tok%20en")
            .unwrap();
        assert_eq!(node.tag, "example.com:8443");
        assert_eq!(options(node).password, "tok en");
    }

    #[test]
    fn test_hysteria2_bandwidth() {
        let hy2 = options(
            Hysteria2Parser
                .parse("hysteria2://pw@h:1?upmbps=50&up=999&down=200%20Mbps")
                .unwrap(),
        );
        assert_eq!(hy2.up_mbps, Some(50));
        assert_eq!(hy2.down_mbps, Some(200));

        let hy2 = options(Hysteria2Parser.parse("hysteria2://pw@h:1?down=fast").unwrap());
        assert_eq!(hy2.down_mbps, None);
        assert_eq!(hy2.up_mbps, None);
    }

    #[test]
    fn test_hysteria2_port_hopping() {
        let hy2 = options(
            Hysteria2Parser
                .parse("hysteria2://pw@h:443?mport=443,20000-30000&hop-interval=30s")
                .unwrap(),
        );
        assert_eq!(hy2.server_ports, vec!["443:443", "20000:30000"]);
        assert_eq!(hy2.hop_interval.as_deref(), Some("30s"));
    }

    #[test]
    fn test_hysteria2_custom_obfs_type() {
        let hy2 = options(
            Hysteria2Parser
                .parse("hysteria2://pw@h:443?obfs=other&obfs-password=x")
                .unwrap(),
        );
        assert_eq!(hy2.obfs.unwrap().obfs_type, "other");
    }

    #[test]
    fn test_hysteria2_missing_password() {
        assert_eq!(
            Hysteria2Parser.parse("hysteria2://example.com:443"),
            Err(ParseError::MissingCredential("password"))
        );
        assert!(matches!(
            Hysteria2Parser.parse("hysteria2://pw@example.com"),
            Err(ParseError::MalformedAddress(_))
        ));
    }
}
