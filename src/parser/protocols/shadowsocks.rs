//! Shadowsocks protocol parser
//!
//! Supports both SIP002 and the legacy fully-encoded form, plus SIP003
//! plugins:
//! - SIP002: `ss://BASE64(method:password)@host:port#tag`
//! - SIP002 plain: `ss://method:password@host:port#tag`
//! - Legacy: `ss://BASE64(method:password@host:port)#tag`
//! - SIP003: `ss://userinfo@host:port/?plugin=name;opts#tag`
//!
//! The format is picked by the *last* `@` in the link body: with one it is
//! SIP002, without one the whole body must be a base64 blob.

use tracing::{trace, warn};

use crate::config::outbound::ShadowsocksOptions;
use crate::error::ParseError;
use crate::model::{Node, NodeProtocol};
use crate::parser::base64::decode_base64;
use crate::parser::params::{QueryParams, parse_server_info, percent_decode};

use super::ProtocolParser;

pub struct ShadowsocksParser;

impl ProtocolParser for ShadowsocksParser {
    fn protocol(&self) -> &'static str {
        "shadowsocks"
    }

    fn parse(&self, uri: &str) -> Result<Node, ParseError> {
        trace!("Parsing Shadowsocks URI");
        let body = uri
            .strip_prefix("ss://")
            .ok_or_else(|| ParseError::MalformedUri("expected ss:// scheme".to_string()))?;

        let (body, name) = match body.split_once('#') {
            Some((body, fragment)) => (body, query_unescape(fragment)),
            None => (body, String::new()),
        };
        let (body, query) = match body.split_once('?') {
            Some((body, query)) => (body, Some(query)),
            None => (body, None),
        };

        let (method, password, server, server_port) = match body.rfind('@') {
            Some(at) => parse_sip002(&body[..at], &body[at + 1..])?,
            None => parse_legacy(body)?,
        };

        if password.is_empty() {
            return Err(ParseError::MissingCredential("password"));
        }

        let (plugin, plugin_opts) = query
            .map(QueryParams::parse)
            .and_then(|params| params.get_string("plugin"))
            .map(|raw| split_plugin(&raw))
            .unwrap_or_default();

        let tag = if name.is_empty() {
            format!("{}:{}", server, server_port)
        } else {
            name
        };

        Ok(Node::new(
            tag,
            server,
            server_port,
            NodeProtocol::Shadowsocks(ShadowsocksOptions {
                method,
                password,
                plugin,
                plugin_opts,
            }),
        ))
    }
}

type Credentials = (String, String, String, u16);

/// `userinfo@host:port` where userinfo is base64 or percent-encoded text.
fn parse_sip002(user_info: &str, server_part: &str) -> Result<Credentials, ParseError> {
    let (server, server_port) = parse_server_info(server_part)?;
    let (method, password) = decode_user_info(user_info)?;
    Ok((method, password, server, server_port))
}

/// `BASE64(method:password@host:port)`
fn parse_legacy(body: &str) -> Result<Credentials, ParseError> {
    let decoded = decode_base64(body.trim_end_matches('/'))?;
    let (user_info, server_part) = decoded
        .rsplit_once('@')
        .ok_or_else(|| ParseError::InvalidUserInfo("legacy link has no @".to_string()))?;
    let (server, server_port) = parse_server_info(server_part)?;
    let (method, password) = split_method(user_info)?;
    Ok((method, password, server, server_port))
}

fn decode_user_info(user_info: &str) -> Result<(String, String), ParseError> {
    let unescaped = percent_decode(user_info);
    for candidate in [user_info, unescaped.as_str()] {
        if let Ok(decoded) = decode_base64(candidate)
            && decoded.contains(':')
        {
            return split_method(&decoded);
        }
    }
    split_method(&unescaped)
}

fn split_method(user_info: &str) -> Result<(String, String), ParseError> {
    match user_info.split_once(':') {
        Some((method, password)) if !method.is_empty() => {
            Ok((method.to_string(), password.to_string()))
        }
        _ => Err(ParseError::InvalidUserInfo(
            "expected method:password".to_string(),
        )),
    }
}

/// SIP003 `plugin=name;opts`. The first `;` separates the name.
fn split_plugin(raw: &str) -> (Option<String>, Option<String>) {
    let (name, opts) = match raw.split_once(';') {
        Some((name, opts)) => (name, Some(opts.to_string()).filter(|o| !o.is_empty())),
        None => (raw, None),
    };
    (Some(normalize_plugin(name)), opts)
}

/// sing-box only ships `obfs-local` and `v2ray-plugin`.
fn normalize_plugin(plugin: &str) -> String {
    match plugin {
        "simple-obfs" => {
            warn!(
                deprecated = "simple-obfs",
                replacement = "obfs-local",
                "Deprecated SIP003 plugin substituted with supported alternative"
            );
            "obfs-local".to_string()
        }
        "obfs-local" | "v2ray-plugin" => plugin.to_string(),
        other => {
            warn!(
                plugin = other,
                "Unknown SIP003 plugin; only 'obfs-local' and 'v2ray-plugin' are supported by sing-box"
            );
            other.to_string()
        }
    }
}

/// Form-style unescape for names: `+` is a space.
fn query_unescape(s: &str) -> String {
    percent_decode(&s.replace('+', " "))
}
