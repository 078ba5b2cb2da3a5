//! Shared pieces of share-link parsing: `host:port` splitting, query
//! parameters with typed accessors, and the TLS / V2Ray transport blocks most
//! protocols carry in their query string.

use std::collections::BTreeMap;

use tracing::{trace, warn};
use url::Url;

use crate::config::outbound::{
    GrpcTransport, HttpTransport, HttpUpgradeTransport, QuicTransport, V2RayTransport,
    WebSocketTransport,
};
use crate::config::shared::{OutboundRealityConfig, OutboundTlsConfig, UtlsConfig};
use crate::error::ParseError;

/// uTLS fingerprint used by Reality when the link does not name one.
pub const DEFAULT_REALITY_FINGERPRINT: &str = "chrome";

// ============================================================================
// Query Parameters
// ============================================================================

/// Decoded query string. The first occurrence of a key wins; empty values
/// read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            map.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(map)
    }

    /// Parses a raw `a=1&b=2` query string with form decoding.
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// First non-empty value among aliases, e.g. `congestion_control` and
    /// `congestion-control`.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// `true` or `1`, case-insensitive. Anything else, including absence, is
    /// `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    pub fn get_int(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// URI Splitting
// ============================================================================

/// A share link split into its address segment, query and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriParts {
    /// `userinfo@host:port`, untouched
    pub address: String,
    pub params: QueryParams,
    /// Percent-decoded fragment, empty when absent
    pub name: String,
}

/// Validates `uri` as a URL and splits it into address, query and name.
pub fn parse_url_params(uri: &str) -> Result<UriParts, ParseError> {
    let url = Url::parse(uri).map_err(|e| ParseError::MalformedUri(e.to_string()))?;
    let params = QueryParams::from_pairs(url.query_pairs().into_owned());

    let rest = uri
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| ParseError::MalformedUri("missing scheme separator ://".to_string()))?;

    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (rest, None),
    };
    let address = rest.split_once('?').map_or(rest, |(address, _)| address);

    let name = fragment.map(percent_decode).unwrap_or_default();
    trace!("Split URI: address={}, {} params, name={:?}", address, params.0.len(), name);

    Ok(UriParts {
        address: address.to_string(),
        params,
        name,
    })
}

/// Percent-decodes `s`, returning it unchanged when the result is not UTF-8.
pub fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Splits `host:port`, handling bracketed IPv6 and a trailing `/`.
pub fn parse_server_info(host_port: &str) -> Result<(String, u16), ParseError> {
    let trimmed = host_port.trim().trim_end_matches('/');
    let malformed = || ParseError::MalformedAddress(host_port.to_string());

    let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(malformed)?;
        let port = after.strip_prefix(':').ok_or_else(malformed)?;
        (host, port)
    } else {
        trimmed.rsplit_once(':').ok_or_else(malformed)?
    };

    if host.is_empty() {
        return Err(malformed());
    }
    let port: u16 = port.parse().map_err(|_| malformed())?;
    Ok((host.to_string(), port))
}

/// Splits an address segment into user info and `host:port` at the first `@`.
pub fn split_user_info(address: &str) -> Option<(&str, &str)> {
    address.split_once('@')
}

/// Splits a comma list and trims each entry, dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// TLS
// ============================================================================

/// Builds the TLS block for `security`, which the caller resolves from the
/// `security` parameter and its protocol default. Returns `None` for `none`.
pub fn build_tls(params: &QueryParams, security: &str) -> Option<OutboundTlsConfig> {
    if security == "none" {
        return None;
    }

    let mut tls = OutboundTlsConfig {
        enabled: true,
        server_name: params.get_any(&["sni", "host"]).map(str::to_string),
        insecure: ["insecure", "allowInsecure", "skip-cert-verify"]
            .iter()
            .any(|k| params.get_bool(k)),
        alpn: params.get("alpn").map(split_list).unwrap_or_default(),
        ..Default::default()
    };

    let fingerprint = params.get("fp");
    if security == "reality" {
        tls.reality = Some(OutboundRealityConfig {
            enabled: true,
            public_key: params.get_string("pbk"),
            short_id: params.get_string("sid"),
        });
        tls.utls = Some(UtlsConfig::with_fingerprint(
            fingerprint.unwrap_or(DEFAULT_REALITY_FINGERPRINT),
        ));
    } else if let Some(fp) = fingerprint {
        tls.utls = Some(UtlsConfig::with_fingerprint(fp));
    }

    Some(tls)
}

// ============================================================================
// Transport
// ============================================================================

/// Builds the V2Ray transport named by the `type` parameter. Plain TCP and
/// unknown kinds produce no transport.
pub fn build_transport(params: &QueryParams) -> Option<V2RayTransport> {
    let kind = params.get("type")?;
    let path = params.get_string("path");

    match kind {
        "tcp" => None,
        "ws" | "websocket" => {
            let mut headers = BTreeMap::new();
            if let Some(host) = params.get("host") {
                headers.insert("Host".to_string(), host.to_string());
            }
            Some(V2RayTransport::WebSocket(WebSocketTransport { path, headers }))
        }
        "http" | "h2" => Some(V2RayTransport::Http(HttpTransport {
            host: params.get("host").map(split_list).unwrap_or_default(),
            path,
        })),
        "grpc" => Some(V2RayTransport::Grpc(GrpcTransport {
            service_name: params.get_string("serviceName"),
        })),
        "quic" => Some(V2RayTransport::Quic(QuicTransport {})),
        "httpupgrade" => Some(V2RayTransport::HttpUpgrade(HttpUpgradeTransport {
            host: params.get_string("host"),
            path,
        })),
        other => {
            warn!("Ignoring unsupported transport type: {}", other);
            None
        }
    }
}
