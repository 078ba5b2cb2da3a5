//! TOML profile: everything a manager instance needs besides the nodes
//! themselves.
//!
//! ```toml
//! nodes = ["trojan://secret@example.com:443#Home"]
//!
//! [settings]
//! mixed_port = 7890
//!
//! [[subscriptions]]
//! name = "airport"
//! url = "https://sub.example.com/link"
//!
//! [[filters]]
//! name = "Hong Kong"
//! include_countries = ["HK"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::util::default_true;
use crate::model::{Filter, Rule, RuleGroup, Settings};
use crate::source::{expand_tilde, fetch_text, is_remote};

/// Subscription source, a file path or an http(s) URL.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub subscriptions: Vec<Subscription>,

    /// Share links added by hand, kept across refreshes
    #[serde(default)]
    pub nodes: Vec<String>,

    #[serde(default)]
    pub filters: Vec<Filter>,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub rule_groups: Vec<RuleGroup>,
}

impl Profile {
    /// Parse profile from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(content).context("Failed to parse profile TOML")?;
        profile.validate()?;
        Ok(profile)
    }

    /// Group names become outbound tags, so they must not collide.
    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for subscription in &self.subscriptions {
            if !names.insert(subscription.name.as_str()) {
                anyhow::bail!("Duplicate subscription name: {}", subscription.name);
            }
        }

        let mut tags = HashSet::new();
        let group_names = self
            .filters
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.rule_groups.iter().map(|g| g.name.as_str()));
        for name in group_names {
            if name.is_empty() {
                anyhow::bail!("Filter and rule group names must not be empty");
            }
            if !tags.insert(name) {
                anyhow::bail!("Duplicate filter or rule group name: {}", name);
            }
        }
        Ok(())
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read profile from {:?}", path))?;
        Self::from_toml(&content)
    }

    pub async fn from_url(url: &str) -> Result<Self> {
        let content = fetch_text(url).await?;
        Self::from_toml(&content)
    }

    /// Load profile from file path or URL
    pub async fn load(path_or_url: &str) -> Result<Self> {
        if is_remote(path_or_url) {
            Self::from_url(path_or_url).await
        } else {
            let expanded = expand_tilde(path_or_url);
            Self::from_file(Path::new(&expanded)).await
        }
    }

    pub fn enabled_subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter().filter(|s| s.enabled)
    }
}
