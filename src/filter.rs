//! Node filter matching
//!
//! Conditions are checked in order: include countries, exclude countries,
//! include keywords, exclude keywords. Empty include lists match every node
//! and excludes always win.

use crate::model::{Filter, Node};

/// Returns whether `node` belongs to the group described by `filter`.
///
/// Country codes compare case-insensitively; a node with no country never
/// satisfies a non-empty include list. Keywords match as case-insensitive
/// substrings of the tag.
pub fn matches(node: &Node, filter: &Filter) -> bool {
    let country = node.country.as_deref();
    let in_list = |list: &[String]| {
        country.is_some_and(|c| list.iter().any(|code| code.eq_ignore_ascii_case(c)))
    };

    if !filter.include_countries.is_empty() && !in_list(&filter.include_countries) {
        return false;
    }
    if in_list(&filter.exclude_countries) {
        return false;
    }

    let tag = node.tag.to_lowercase();
    let mentions = |keyword: &String| tag.contains(&keyword.to_lowercase());

    if !filter.include.is_empty() && !filter.include.iter().any(mentions) {
        return false;
    }
    !filter.exclude.iter().any(mentions)
}

impl Filter {
    /// Tags of the nodes this filter selects, in node order.
    pub fn matched_tags(&self, nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .filter(|node| matches(node, self))
            .map(|node| node.tag.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::outbound::TrojanOptions;
    use crate::model::NodeProtocol;

    fn node(tag: &str, country: Option<&str>) -> Node {
        let mut node = Node::new(
            tag,
            "example.com",
            443,
            NodeProtocol::Trojan(TrojanOptions {
                password: "pw".to_string(),
                ..Default::default()
            }),
        );
        node.country = country.map(str::to_string);
        node
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::new("All");
        assert!(matches(&node("HK 01", Some("HK")), &filter));
        assert!(matches(&node("anything", None), &filter));
    }

    #[test]
    fn test_include_countries_case_insensitive() {
        let filter = Filter {
            include_countries: strings(&["hk", "JP"]),
            ..Filter::new("Asia")
        };
        assert!(matches(&node("a", Some("HK")), &filter));
        assert!(matches(&node("b", Some("jp")), &filter));
        assert!(!matches(&node("c", Some("US")), &filter));
        assert!(!matches(&node("d", None), &filter));
    }

    #[test]
    fn test_exclude_beats_include() {
        let filter = Filter {
            include_countries: strings(&["HK"]),
            exclude_countries: strings(&["hk"]),
            ..Filter::new("Nothing")
        };
        assert!(!matches(&node("HK 01", Some("HK")), &filter));

        let filter = Filter {
            include: strings(&["hk"]),
            exclude: strings(&["IPLC"]),
            ..Filter::new("Plain HK")
        };
        assert!(matches(&node("HK 01", None), &filter));
        assert!(!matches(&node("HK iplc 02", None), &filter));
    }

    #[test]
    fn test_exclude_countries_ignores_nodes_without_country() {
        let filter = Filter {
            exclude_countries: strings(&["CN"]),
            ..Filter::new("No CN")
        };
        assert!(matches(&node("x", None), &filter));
        assert!(!matches(&node("y", Some("CN")), &filter));
    }

    #[test]
    fn test_include_keywords_any() {
        let filter = Filter {
            include: strings(&["Premium", "VIP"]),
            ..Filter::new("Fast")
        };
        assert!(matches(&node("US premium 1", None), &filter));
        assert!(matches(&node("vip-jp", None), &filter));
        assert!(!matches(&node("basic", None), &filter));
    }

    #[test]
    fn test_matched_tags_preserves_order() {
        let nodes = vec![
            node("HK 01", Some("HK")),
            node("US 01", Some("US")),
            node("HK 02", Some("HK")),
        ];
        let filter = Filter {
            include_countries: strings(&["HK"]),
            ..Filter::new("HK")
        };
        assert_eq!(filter.matched_tags(&nodes), vec!["HK 01", "HK 02"]);

        let empty = Filter {
            include_countries: strings(&["XX"]),
            ..Filter::new("Empty")
        };
        assert!(empty.matched_tags(&nodes).is_empty());
    }

    proptest! {
        #[test]
        fn prop_empty_conditions_match_all(
            tag in "\\PC{0,24}",
            country in proptest::option::of("[A-Z]{2}"),
        ) {
            let node = node(&tag, country.as_deref());
            prop_assert!(matches(&node, &Filter::new("any")));
        }

        #[test]
        fn prop_excluded_keyword_never_matches(
            prefix in "[a-z ]{0,8}",
            keyword in "[a-z]{1,6}",
            suffix in "[a-z ]{0,8}",
        ) {
            let tag = format!("{prefix}{keyword}{suffix}");
            let filter = Filter {
                include: vec![keyword.clone()],
                exclude: vec![keyword.to_uppercase()],
                ..Filter::new("f")
            };
            prop_assert!(!matches(&node(&tag, None), &filter));
        }
    }
}
