//! Read-only view over the collections a configuration is built from.

use crate::builder::ConfigBuilder;
use crate::model::{Filter, Node, Rule, RuleGroup, Settings};

/// Source of the settings, nodes, filters, rules and rule groups.
///
/// Implementors hand out borrowed slices so that one [`ConfigBuilder`] sees
/// all five collections from the same moment.
pub trait Store {
    fn settings(&self) -> &Settings;
    fn nodes(&self) -> &[Node];
    fn filters(&self) -> &[Filter];
    fn rules(&self) -> &[Rule];
    fn rule_groups(&self) -> &[RuleGroup];

    fn config_builder(&self) -> ConfigBuilder<'_> {
        ConfigBuilder::new(
            self.settings(),
            self.nodes(),
            self.filters(),
            self.rules(),
            self.rule_groups(),
        )
    }
}

/// Owned, in-memory [`Store`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub settings: Settings,
    pub nodes: Vec<Node>,
    pub filters: Vec<Filter>,
    pub rules: Vec<Rule>,
    pub rule_groups: Vec<RuleGroup>,
}

impl Store for Snapshot {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn filters(&self) -> &[Filter] {
        &self.filters
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn rule_groups(&self) -> &[RuleGroup] {
        &self.rule_groups
    }
}
