//! VLESS protocol parser
//!
//! Format: `vless://uuid@host:port?params#tag`

use tracing::trace;

use crate::config::outbound::VLessOptions;
use crate::error::ParseError;
use crate::model::{Node, NodeProtocol};
use crate::parser::params::{
    build_tls, build_transport, parse_server_info, parse_url_params, percent_decode,
    split_user_info,
};

use super::{ProtocolParser, default_tag};

pub struct VLessParser;

impl ProtocolParser for VLessParser {
    fn protocol(&self) -> &'static str {
        "vless"
    }

    fn parse(&self, uri: &str) -> Result<Node, ParseError> {
        trace!("Parsing VLESS URI");
        let parts = parse_url_params(uri)?;

        let (user_info, server_part) = split_user_info(&parts.address)
            .ok_or_else(|| ParseError::InvalidUserInfo("expected uuid@host:port".to_string()))?;
        let uuid = percent_decode(user_info);
        if uuid.is_empty() {
            return Err(ParseError::MissingCredential("uuid"));
        }

        let (server, server_port) = parse_server_info(server_part)?;
        let params = &parts.params;

        // Plain VLESS links are common, so no TLS unless asked for
        let security = params.get("security").unwrap_or("none");

        Ok(Node::new(
            default_tag(parts.name, &server, server_port),
            server,
            server_port,
            NodeProtocol::VLess(VLessOptions {
                uuid,
                flow: params.get_string("flow"),
                packet_encoding: params.get_string("packetEncoding"),
                tls: build_tls(params, security),
                transport: build_transport(params),
            }),
        ))
    }
}
