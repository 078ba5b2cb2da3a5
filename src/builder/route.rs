//! Route section: remote rule sets, the DNS hijack rule, custom rules and
//! rule group rules.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::config::route::{RemoteRuleSet, Route, RouteRule, RuleSet, RuleSetFormat};
use crate::model::{Rule, RuleType};

use super::{ConfigBuilder, DIRECT_TAG, DNS_OUT_TAG, FINAL_TAG};

pub fn geosite_tag(name: &str) -> String {
    format!("geosite-{}", name)
}

pub fn geoip_tag(name: &str) -> String {
    format!("geoip-{}", name)
}

impl ConfigBuilder<'_> {
    pub(super) fn build_route(&self) -> Route {
        let mut rules = vec![RouteRule::to_outbound(DNS_OUT_TAG).with_protocol("dns")];

        let mut custom: Vec<&Rule> = self.rules.iter().filter(|r| r.enabled).collect();
        custom.sort_by_key(|r| r.priority);
        for rule in custom {
            let route_rule = custom_rule(rule);
            if route_rule.has_no_conditions() {
                warn!(
                    "{:?} rule to '{}' has no usable values and matches all traffic",
                    rule.rule_type, rule.outbound
                );
            }
            rules.push(route_rule);
        }

        for group in self.rule_groups.iter().filter(|g| g.enabled) {
            if !group.site_rules.is_empty() {
                rules.push(
                    RouteRule::to_outbound(&group.name)
                        .with_rule_set(group.site_rules.iter().map(|s| geosite_tag(s)).collect()),
                );
            }
            if !group.ip_rules.is_empty() {
                rules.push(
                    RouteRule::to_outbound(&group.name)
                        .with_rule_set(group.ip_rules.iter().map(|s| geoip_tag(s)).collect()),
                );
            }
        }

        Route {
            rules,
            rule_set: self.rule_sets(),
            final_outbound: Some(FINAL_TAG.to_string()),
            auto_detect_interface: true,
        }
    }

    /// Remote rule sets referenced by enabled rule groups, first-seen order.
    fn rule_sets(&self) -> Vec<RuleSet> {
        let base = self.settings.rule_set_base_url.trim_end_matches('/');
        let mut seen = HashSet::new();
        let mut rule_sets = Vec::new();

        for group in self.rule_groups.iter().filter(|g| g.enabled) {
            let sites = group
                .site_rules
                .iter()
                .map(|name| (geosite_tag(name), format!("{}/geosite-{}.srs", base, name)));
            let ips = group.ip_rules.iter().map(|name| {
                (
                    geoip_tag(name),
                    format!("{}/../rule-set-geoip/geoip-{}.srs", base, name),
                )
            });

            for (tag, url) in sites.chain(ips) {
                if seen.insert(tag.clone()) {
                    trace!("Rule set {} -> {}", tag, url);
                    rule_sets.push(RuleSet::Remote(
                        RemoteRuleSet::new(tag, url)
                            .with_format(RuleSetFormat::Binary)
                            .with_download_detour(DIRECT_TAG),
                    ));
                }
            }
        }

        rule_sets
    }
}

/// Route rule for one custom rule. Blank values are dropped.
fn custom_rule(rule: &Rule) -> RouteRule {
    let mut route_rule = RouteRule::to_outbound(&rule.outbound);
    let values = || rule.values.iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    match rule.rule_type {
        RuleType::DomainSuffix => route_rule.domain_suffix = values().collect(),
        RuleType::DomainKeyword => route_rule.domain_keyword = values().collect(),
        RuleType::Domain => route_rule.domain = values().collect(),
        RuleType::IpCidr => route_rule.ip_cidr = values().collect(),
        RuleType::Geosite => route_rule.rule_set = values().map(|v| geosite_tag(&v)).collect(),
        RuleType::Geoip => route_rule.rule_set = values().map(|v| geoip_tag(&v)).collect(),
        RuleType::Port => {
            for value in values() {
                if let Ok(port) = value.parse::<u16>() {
                    route_rule.port.push(port);
                } else if let Some((start, end)) = value.split_once([':', '-']) {
                    route_rule.port_range.push(format!("{}:{}", start.trim(), end.trim()));
                } else {
                    warn!("Ignoring invalid port value '{}'", value);
                }
            }
        }
    }

    route_rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RuleGroup, Settings};

    fn rule(priority: i32, rule_type: RuleType, values: &[&str], outbound: &str) -> Rule {
        Rule {
            priority,
            enabled: true,
            rule_type,
            values: values.iter().map(|v| v.to_string()).collect(),
            outbound: outbound.to_string(),
        }
    }

    fn group(name: &str, sites: &[&str], ips: &[&str]) -> RuleGroup {
        RuleGroup {
            name: name.to_string(),
            enabled: true,
            outbound: "Proxy".to_string(),
            site_rules: sites.iter().map(|s| s.to_string()).collect(),
            ip_rules: ips.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_route_has_dns_hijack_and_final() {
        let settings = Settings::default();
        let route = ConfigBuilder::new(&settings, &[], &[], &[], &[]).build_route();
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            serde_json::json!({
                "rules": [{"protocol": ["dns"], "outbound": "dns-out"}],
                "final": "Final",
                "auto_detect_interface": true
            })
        );
    }

    #[test]
    fn test_custom_rules_sorted_by_priority_stable() {
        let settings = Settings::default();
        let rules = vec![
            rule(10, RuleType::Domain, &["late.com"], "DIRECT"),
            rule(1, RuleType::DomainSuffix, &["first.com"], "Proxy"),
            rule(10, RuleType::DomainKeyword, &["tie"], "REJECT"),
            Rule {
                enabled: false,
                ..rule(0, RuleType::Domain, &["off.com"], "DIRECT")
            },
        ];
        let route = ConfigBuilder::new(&settings, &[], &[], &rules, &[]).build_route();
        let outbounds: Vec<_> = route
            .rules
            .iter()
            .map(|r| r.outbound.as_deref().unwrap())
            .collect();
        assert_eq!(outbounds, vec!["dns-out", "Proxy", "DIRECT", "REJECT"]);
        assert_eq!(route.rules[1].domain_suffix, vec!["first.com"]);
        assert_eq!(route.rules[2].domain, vec!["late.com"]);
        assert_eq!(route.rules[3].domain_keyword, vec!["tie"]);
    }

    #[test]
    fn test_custom_rule_types() {
        let r = custom_rule(&rule(0, RuleType::IpCidr, &["10.0.0.0/8"], "DIRECT"));
        assert_eq!(r.ip_cidr, vec!["10.0.0.0/8"]);

        let r = custom_rule(&rule(0, RuleType::Geosite, &["google", "github"], "Proxy"));
        assert_eq!(r.rule_set, vec!["geosite-google", "geosite-github"]);

        let r = custom_rule(&rule(0, RuleType::Geoip, &["cn"], "DIRECT"));
        assert_eq!(r.rule_set, vec!["geoip-cn"]);
    }

    #[test]
    fn test_port_rule_values() {
        let r = custom_rule(&rule(
            0,
            RuleType::Port,
            &["443", " 80 ", "1000:2000", "3000-4000", "nope"],
            "Proxy",
        ));
        assert_eq!(r.port, vec![443, 80]);
        assert_eq!(r.port_range, vec!["1000:2000", "3000:4000"]);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["port"], serde_json::json!([443, 80]));
    }

    #[test]
    fn test_every_enabled_rule_emits_one_route_rule() {
        let settings = Settings::default();
        let rules = vec![
            rule(0, RuleType::Domain, &[], "DIRECT"),
            rule(1, RuleType::Port, &["https"], "REJECT"),
            rule(2, RuleType::DomainSuffix, &[" ", "example.com "], "Proxy"),
        ];
        let route = ConfigBuilder::new(&settings, &[], &[], &rules, &[]).build_route();

        assert_eq!(route.rules.len(), 4);
        assert!(route.rules[1].has_no_conditions());
        assert_eq!(route.rules[1].outbound.as_deref(), Some("DIRECT"));
        assert!(route.rules[2].has_no_conditions());
        assert_eq!(route.rules[2].outbound.as_deref(), Some("REJECT"));
        assert_eq!(route.rules[3].domain_suffix, vec!["example.com"]);
    }

    #[test]
    fn test_rule_group_rules_and_rule_sets() {
        let settings = Settings {
            rule_set_base_url: "https://rules.example.com/sets/".to_string(),
            ..Settings::default()
        };
        let groups = vec![
            group("Google", &["google"], &["google"]),
            group("CN", &["cn", "google"], &[]),
            RuleGroup {
                enabled: false,
                ..group("Off", &["ignored"], &["ignored"])
            },
        ];
        let route = ConfigBuilder::new(&settings, &[], &[], &[], &groups).build_route();

        assert_eq!(route.rules.len(), 4);
        assert_eq!(route.rules[1].rule_set, vec!["geosite-google"]);
        assert_eq!(route.rules[1].outbound.as_deref(), Some("Google"));
        assert_eq!(route.rules[2].rule_set, vec!["geoip-google"]);
        assert_eq!(route.rules[3].rule_set, vec!["geosite-cn", "geosite-google"]);
        assert_eq!(route.rules[3].outbound.as_deref(), Some("CN"));

        let tags: Vec<_> = route.rule_set.iter().map(RuleSet::tag).collect();
        assert_eq!(tags, vec!["geosite-google", "geoip-google", "geosite-cn"]);

        assert_eq!(
            serde_json::to_value(&route.rule_set[1]).unwrap(),
            serde_json::json!({
                "type": "remote",
                "tag": "geoip-google",
                "format": "binary",
                "url": "https://rules.example.com/sets/../rule-set-geoip/geoip-google.srs",
                "download_detour": "DIRECT"
            })
        );
        let RuleSet::Remote(geosite) = &route.rule_set[0];
        assert_eq!(
            geosite.url,
            "https://rules.example.com/sets/geosite-google.srs"
        );
    }
}
