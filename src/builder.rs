//! sing-box configuration builder
//!
//! Compiles one snapshot of nodes, filters, rules, rule groups and settings
//! into a [`SingBoxConfig`]. Building is pure: the inputs are borrowed, never
//! modified, and the same inputs always produce byte-identical JSON.

use thiserror::Error;
use tracing::debug;

use crate::config::SingBoxConfig;
use crate::config::dns::{Dns, DnsRule, DnsServer};
use crate::config::experimental::{CacheFile, ClashApi, Experimental};
use crate::config::inbound::{Inbound, MixedInbound, TunInbound};
use crate::config::log::{Log, LogLevel};
use crate::config::ntp::Ntp;
use crate::config::shared::ListenFields;
use crate::model::{Filter, Node, Rule, RuleGroup, Settings};

mod outbounds;
mod route;

pub use route::{geoip_tag, geosite_tag};

// ============================================================================
// Well-known tags
// ============================================================================

pub const DIRECT_TAG: &str = "DIRECT";
pub const REJECT_TAG: &str = "REJECT";
pub const DNS_OUT_TAG: &str = "dns-out";
pub const AUTO_TAG: &str = "Auto";
pub const PROXY_TAG: &str = "Proxy";
pub const FINAL_TAG: &str = "Final";

pub const DNS_PROXY_TAG: &str = "dns_proxy";
pub const DNS_DIRECT_TAG: &str = "dns_direct";
pub const DNS_RESOLVER_TAG: &str = "dns_resolver";
pub const DNS_BLOCK_TAG: &str = "dns_block";

const DNS_RESOLVER_ADDRESS: &str = "223.5.5.5";
const DNS_BLOCK_ADDRESS: &str = "rcode://success";
const NTP_SERVER: &str = "time.apple.com";

const TUN_ADDRESSES: [&str; 2] = ["172.19.0.1/30", "fdfe:dcba:9876::1/126"];
const ZASHBOARD_DOWNLOAD_URL: &str =
    "https://github.com/Zephyruso/zashboard/archive/refs/heads/gh-pages.zip";

/// Errors from [`ConfigBuilder::build_json`]
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Borrowed snapshot the configuration is built from.
pub struct ConfigBuilder<'a> {
    settings: &'a Settings,
    nodes: &'a [Node],
    filters: &'a [Filter],
    rules: &'a [Rule],
    rule_groups: &'a [RuleGroup],
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(
        settings: &'a Settings,
        nodes: &'a [Node],
        filters: &'a [Filter],
        rules: &'a [Rule],
        rule_groups: &'a [RuleGroup],
    ) -> Self {
        Self {
            settings,
            nodes,
            filters,
            rules,
            rule_groups,
        }
    }

    /// Assembles the full configuration.
    pub fn build(&self) -> SingBoxConfig {
        debug!(
            "Building config from {} nodes, {} filters, {} rules, {} rule groups",
            self.nodes.len(),
            self.filters.len(),
            self.rules.len(),
            self.rule_groups.len()
        );

        let config = SingBoxConfig::builder()
            .log(Log::with_level(LogLevel::Info))
            .dns(self.build_dns())
            .ntp(Ntp::with_server(NTP_SERVER))
            .inbounds(self.build_inbounds())
            .outbounds(self.build_outbounds())
            .route(self.build_route())
            .experimental(self.build_experimental())
            .build();

        debug!("Built config with {} outbounds", config.outbounds.len());
        config
    }

    /// Pretty-printed JSON of [`build`](Self::build).
    pub fn build_json(&self) -> Result<String, BuildError> {
        Ok(self.build().to_json_pretty()?)
    }

    fn build_dns(&self) -> Dns {
        Dns {
            servers: vec![
                DnsServer::new(DNS_PROXY_TAG, &self.settings.proxy_dns)
                    .with_resolver(DNS_RESOLVER_TAG)
                    .with_detour(PROXY_TAG),
                DnsServer::new(DNS_DIRECT_TAG, &self.settings.direct_dns)
                    .with_resolver(DNS_RESOLVER_TAG)
                    .with_detour(DIRECT_TAG),
                DnsServer::new(DNS_RESOLVER_TAG, DNS_RESOLVER_ADDRESS),
                DnsServer::new(DNS_BLOCK_TAG, DNS_BLOCK_ADDRESS),
            ],
            rules: vec![
                DnsRule::rule_set(geosite_tag("category-ads-all"), DNS_BLOCK_TAG),
                DnsRule::rule_set(geosite_tag("geolocation-cn"), DNS_DIRECT_TAG),
                DnsRule::rule_set(geosite_tag("geolocation-!cn"), DNS_PROXY_TAG),
            ],
            r#final: Some(DNS_DIRECT_TAG.to_string()),
            independent_cache: false,
        }
    }

    fn build_inbounds(&self) -> Vec<Inbound> {
        let mut inbounds = vec![Inbound::Mixed(MixedInbound {
            tag: "mixed-in".to_string(),
            listen: ListenFields::sniffing(
                Some("127.0.0.1".to_string()),
                Some(self.settings.mixed_port),
            ),
            set_system_proxy: false,
        })];

        if self.settings.tun_enabled {
            inbounds.push(Inbound::Tun(TunInbound {
                tag: "tun-in".to_string(),
                address: TUN_ADDRESSES.iter().map(|a| a.to_string()).collect(),
                auto_route: true,
                strict_route: true,
                stack: Some("system".to_string()),
                sniff: true,
                sniff_override_destination: true,
                ..Default::default()
            }));
        }

        inbounds
    }

    /// Clash API and cache file, only when the API port is set.
    fn build_experimental(&self) -> Option<Experimental> {
        let settings = self.settings;
        if settings.clash_api_port == 0 {
            return None;
        }

        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        Some(Experimental {
            clash_api: Some(ClashApi {
                external_controller: Some(format!("127.0.0.1:{}", settings.clash_api_port)),
                external_ui: non_empty(&settings.clash_ui_path),
                external_ui_download_url: Some(ZASHBOARD_DOWNLOAD_URL.to_string()),
                secret: non_empty(&settings.clash_api_secret),
                default_mode: Some("rule".to_string()),
            }),
            cache_file: Some(CacheFile {
                enabled: true,
                path: Some("cache.db".to_string()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::outbound::Outbound;

    fn build(settings: &Settings) -> SingBoxConfig {
        ConfigBuilder::new(settings, &[], &[], &[], &[]).build()
    }

    #[test]
    fn test_log_dns_ntp_sections() {
        let settings = Settings::default();
        let json = serde_json::to_value(build(&settings)).unwrap();

        assert_eq!(json["log"], serde_json::json!({"level": "info", "timestamp": true}));
        assert_eq!(
            json["ntp"],
            serde_json::json!({"enabled": true, "server": "time.apple.com"})
        );

        let dns = &json["dns"];
        assert_eq!(dns["final"], "dns_direct");
        assert_eq!(
            dns["servers"][0],
            serde_json::json!({
                "tag": "dns_proxy",
                "address": "https://1.1.1.1/dns-query",
                "address_resolver": "dns_resolver",
                "detour": "Proxy"
            })
        );
        assert_eq!(dns["servers"][1]["detour"], "DIRECT");
        assert_eq!(dns["servers"][2], serde_json::json!({"tag": "dns_resolver", "address": "223.5.5.5"}));
        assert_eq!(dns["servers"][3]["address"], "rcode://success");
        assert_eq!(
            dns["rules"],
            serde_json::json!([
                {"rule_set": ["geosite-category-ads-all"], "server": "dns_block"},
                {"rule_set": ["geosite-geolocation-cn"], "server": "dns_direct"},
                {"rule_set": ["geosite-geolocation-!cn"], "server": "dns_proxy"}
            ])
        );
    }

    #[test]
    fn test_inbounds_without_tun() {
        let settings = Settings {
            mixed_port: 7890,
            ..Settings::default()
        };
        let json = serde_json::to_value(build(&settings)).unwrap();
        assert_eq!(
            json["inbounds"],
            serde_json::json!([{
                "type": "mixed",
                "tag": "mixed-in",
                "listen": "127.0.0.1",
                "listen_port": 7890,
                "sniff": true,
                "sniff_override_destination": true
            }])
        );
    }

    #[test]
    fn test_inbounds_with_tun() {
        let settings = Settings {
            tun_enabled: true,
            ..Settings::default()
        };
        let config = build(&settings);
        assert_eq!(config.inbounds.len(), 2);
        let json = serde_json::to_value(&config.inbounds[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "tun",
                "tag": "tun-in",
                "address": ["172.19.0.1/30", "fdfe:dcba:9876::1/126"],
                "auto_route": true,
                "strict_route": true,
                "stack": "system",
                "sniff": true,
                "sniff_override_destination": true
            })
        );
    }

    #[test]
    fn test_experimental_gated_on_port() {
        let settings = Settings {
            clash_api_port: 0,
            ..Settings::default()
        };
        assert!(build(&settings).experimental.is_none());

        let settings = Settings {
            clash_api_port: 9090,
            clash_api_secret: "s3cret".to_string(),
            ..Settings::default()
        };
        let json = serde_json::to_value(build(&settings).experimental).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "clash_api": {
                    "external_controller": "127.0.0.1:9090",
                    "external_ui": "zashboard",
                    "external_ui_download_url": ZASHBOARD_DOWNLOAD_URL,
                    "secret": "s3cret",
                    "default_mode": "rule"
                },
                "cache_file": {"enabled": true, "path": "cache.db"}
            })
        );
    }

    #[test]
    fn test_experimental_omits_empty_ui_and_secret() {
        let settings = Settings {
            clash_ui_path: String::new(),
            ..Settings::default()
        };
        let clash_api = build(&settings).experimental.unwrap().clash_api.unwrap();
        assert!(clash_api.external_ui.is_none());
        assert!(clash_api.secret.is_none());
    }

    #[test]
    fn test_build_json_is_pretty_and_parses_back() {
        let settings = Settings::default();
        let builder = ConfigBuilder::new(&settings, &[], &[], &[], &[]);
        let json = builder.build_json().unwrap();
        assert!(json.starts_with("{\n  \"log\""));
        let parsed = SingBoxConfig::from_json(&json).unwrap();
        assert_eq!(parsed, builder.build());
        assert!(matches!(parsed.outbound("Final"), Some(Outbound::Selector(_))));
    }
}
