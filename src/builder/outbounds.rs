//! Outbound list: built-ins, one outbound per node, then the selection
//! graph layered on top of them.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use crate::config::outbound::{
    BlockOutbound, DirectOutbound, DnsOutbound, Outbound, SelectorOutbound, UrlTestOutbound,
};
use crate::country::group_tag;
use crate::model::{Filter, FilterMode};

use super::{AUTO_TAG, ConfigBuilder, DIRECT_TAG, DNS_OUT_TAG, FINAL_TAG, PROXY_TAG, REJECT_TAG};

pub const DEFAULT_URL_TEST_URL: &str = "https://www.gstatic.com/generate_204";
pub const DEFAULT_URL_TEST_INTERVAL: &str = "5m";
pub const DEFAULT_URL_TEST_TOLERANCE: u32 = 50;

/// Group tags referenced by every composite selector, in option order.
struct GroupTags {
    countries: Vec<String>,
    filters: Vec<String>,
    nodes: Vec<String>,
}

impl ConfigBuilder<'_> {
    /// Outbounds in their fixed order: built-ins, nodes, filter groups,
    /// country groups, `Auto`, `Proxy`, rule group selectors, `Final`.
    pub(super) fn build_outbounds(&self) -> Vec<Outbound> {
        let mut outbounds = vec![
            Outbound::Direct(DirectOutbound::new(DIRECT_TAG)),
            Outbound::Block(BlockOutbound::new(REJECT_TAG)),
            Outbound::Dns(DnsOutbound::new(DNS_OUT_TAG)),
        ];
        outbounds.extend(self.nodes.iter().map(Outbound::from));

        let node_tags = self.unique_node_tags();

        let filter_groups = self.filter_groups();
        let filter_tags: Vec<String> = filter_groups.iter().map(|o| o.tag().to_string()).collect();
        outbounds.extend(filter_groups);

        let country_groups = self.country_groups();
        let country_tags: Vec<String> =
            country_groups.iter().map(|o| o.tag().to_string()).collect();
        outbounds.extend(country_groups);

        let tags = GroupTags {
            countries: country_tags,
            filters: filter_tags,
            nodes: node_tags,
        };
        debug!(
            "Outbound groups: {} filter, {} country, {} unique nodes",
            tags.filters.len(),
            tags.countries.len(),
            tags.nodes.len()
        );

        // An empty urltest is rejected by sing-box, and Proxy defaults to Auto
        let auto_members = if tags.nodes.is_empty() {
            vec![DIRECT_TAG.to_string()]
        } else {
            tags.nodes.clone()
        };
        outbounds.push(Outbound::UrlTest(default_urltest(AUTO_TAG, auto_members)));

        let proxy_options = compose(&[AUTO_TAG], &tags, true);
        outbounds.push(Outbound::Selector(
            SelectorOutbound::new(PROXY_TAG, proxy_options).with_default(AUTO_TAG),
        ));

        for group in self.rule_groups.iter().filter(|g| g.enabled) {
            let options = compose(&[PROXY_TAG, AUTO_TAG, DIRECT_TAG, REJECT_TAG], &tags, true);
            outbounds.push(Outbound::Selector(
                SelectorOutbound::new(&group.name, options).with_default(&group.outbound),
            ));
        }

        let final_options = compose(&[PROXY_TAG, DIRECT_TAG], &tags, false);
        outbounds.push(Outbound::Selector(
            SelectorOutbound::new(FINAL_TAG, final_options)
                .with_default(&self.settings.final_outbound),
        ));

        outbounds
    }

    /// Node tags in first-seen order with duplicates collapsed.
    fn unique_node_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .filter(|node| seen.insert(node.tag.as_str()))
            .map(|node| node.tag.clone())
            .collect()
    }

    /// One group per enabled filter that selects at least one node.
    fn filter_groups(&self) -> Vec<Outbound> {
        self.filters
            .iter()
            .filter(|filter| filter.enabled)
            .filter_map(|filter| {
                let members = filter.matched_tags(self.nodes);
                if members.is_empty() {
                    debug!("Skipping filter '{}': no matching nodes", filter.name);
                    return None;
                }
                trace!("Filter '{}' matched {} nodes", filter.name, members.len());
                Some(filter_group(filter, members))
            })
            .collect()
    }

    /// One urltest group per country code, sorted by code.
    fn country_groups(&self) -> Vec<Outbound> {
        let mut by_country: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in self.nodes {
            let Some(code) = node.country.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            let members = by_country.entry(code.to_ascii_uppercase()).or_default();
            if !members.contains(&node.tag) {
                members.push(node.tag.clone());
            }
        }

        by_country
            .into_iter()
            .map(|(code, members)| Outbound::UrlTest(default_urltest(group_tag(&code), members)))
            .collect()
    }
}

fn filter_group(filter: &Filter, members: Vec<String>) -> Outbound {
    match filter.mode {
        FilterMode::Selector => Outbound::Selector(SelectorOutbound::new(&filter.name, members)),
        FilterMode::UrlTest => {
            let check = filter.urltest.clone().unwrap_or_default();
            Outbound::UrlTest(
                UrlTestOutbound::new(&filter.name, members)
                    .with_url(check.url.unwrap_or_else(|| DEFAULT_URL_TEST_URL.to_string()))
                    .with_interval(
                        check
                            .interval
                            .unwrap_or_else(|| DEFAULT_URL_TEST_INTERVAL.to_string()),
                    )
                    .with_tolerance(check.tolerance.unwrap_or(DEFAULT_URL_TEST_TOLERANCE)),
            )
        }
    }
}

fn default_urltest(tag: impl Into<String>, members: Vec<String>) -> UrlTestOutbound {
    UrlTestOutbound::new(tag, members)
        .with_url(DEFAULT_URL_TEST_URL)
        .with_interval(DEFAULT_URL_TEST_INTERVAL)
        .with_tolerance(DEFAULT_URL_TEST_TOLERANCE)
}

/// `head`, then country groups, filter groups and optionally node tags.
fn compose(head: &[&str], tags: &GroupTags, with_nodes: bool) -> Vec<String> {
    let nodes: &[String] = if with_nodes { &tags.nodes } else { &[] };
    head.iter()
        .map(|t| t.to_string())
        .chain(tags.countries.iter().cloned())
        .chain(tags.filters.iter().cloned())
        .chain(nodes.iter().cloned())
        .collect()
}
