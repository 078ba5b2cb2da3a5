//! Trojan protocol parser
//!
//! Format: `trojan://password@host:port?params#tag`

use tracing::trace;

use crate::config::outbound::TrojanOptions;
use crate::error::ParseError;
use crate::model::{Node, NodeProtocol};
use crate::parser::params::{
    build_tls, build_transport, parse_server_info, parse_url_params, percent_decode,
    split_user_info,
};

use super::{ProtocolParser, default_tag};

pub struct TrojanParser;

impl ProtocolParser for TrojanParser {
    fn protocol(&self) -> &'static str {
        "trojan"
    }

    fn parse(&self, uri: &str) -> Result<Node, ParseError> {
        trace!("Parsing Trojan URI");
        let parts = parse_url_params(uri)?;

        let (user_info, server_part) = split_user_info(&parts.address)
            .ok_or_else(|| ParseError::InvalidUserInfo("expected password@host:port".to_string()))?;
        let password = percent_decode(user_info);
        if password.is_empty() {
            return Err(ParseError::MissingCredential("password"));
        }

        let (server, server_port) = parse_server_info(server_part)?;
        let params = &parts.params;

        // Trojan runs over TLS unless told otherwise
        let security = params.get("security").unwrap_or("tls");

        Ok(Node::new(
            default_tag(parts.name, &server, server_port),
            server,
            server_port,
            NodeProtocol::Trojan(TrojanOptions {
                password,
                tls: build_tls(params, security),
                transport: build_transport(params),
            }),
        ))
    }
}
