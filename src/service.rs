//! Manager: owns the profile and the current node snapshot, refreshes
//! subscriptions and writes the generated configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::model::{Filter, Node, Rule, RuleGroup, Settings};
use crate::parser::{ImportReport, import_subscription};
use crate::profile::{Profile, Subscription};
use crate::source::{expand_tilde, read_text};
use crate::store::{Snapshot, Store};

/// Outcome of one [`Manager::refresh_all`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Sources fetched and imported
    pub sources: usize,
    /// Sources that could not be fetched; their previous nodes are kept
    pub failed_sources: usize,
    pub nodes: usize,
    /// Lines that failed to parse, across all sources
    pub line_errors: usize,
}

pub struct Manager {
    profile: Profile,
    /// Nodes from the manual URIs in the profile
    manual: Vec<Node>,
    /// Last successful import per subscription name
    fetched: HashMap<String, Vec<Node>>,
    snapshot: Snapshot,
}

impl Manager {
    pub fn new(profile: Profile) -> Self {
        let report = import_subscription(&profile.nodes.join("\n"));
        log_report("manual nodes", &report);

        let mut manager = Self {
            snapshot: Snapshot {
                settings: profile.settings.clone(),
                filters: profile.filters.clone(),
                rules: profile.rules.clone(),
                rule_groups: profile.rule_groups.clone(),
                nodes: Vec::new(),
            },
            manual: report.nodes,
            fetched: HashMap::new(),
            profile,
        };
        manager.rebuild_nodes();
        manager
    }

    pub async fn load(path_or_url: &str) -> Result<Self> {
        info!("Loading profile from: {}", path_or_url);
        Ok(Self::new(Profile::load(path_or_url).await?))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Fetches and imports every enabled subscription.
    ///
    /// The node list is replaced only after all sources were processed. A
    /// source that cannot be fetched keeps its previous nodes; if every
    /// source fails the refresh is an error and nothing changes.
    pub async fn refresh_all(&mut self) -> Result<RefreshSummary> {
        let subscriptions: Vec<Subscription> =
            self.profile.enabled_subscriptions().cloned().collect();
        let mut summary = RefreshSummary::default();
        let mut fetched = HashMap::new();

        for subscription in &subscriptions {
            match fetch_subscription(subscription).await {
                Ok(report) => {
                    summary.sources += 1;
                    summary.line_errors += report.failed();
                    fetched.insert(subscription.name.clone(), report.nodes);
                }
                Err(e) => {
                    warn!("Subscription '{}' failed: {:#}", subscription.name, e);
                    summary.failed_sources += 1;
                }
            }
        }

        if summary.sources == 0 && summary.failed_sources > 0 {
            anyhow::bail!("All {} subscriptions failed to refresh", summary.failed_sources);
        }

        let enabled: Vec<&str> = subscriptions.iter().map(|s| s.name.as_str()).collect();
        self.fetched.retain(|name, _| enabled.contains(&name.as_str()));
        self.fetched.extend(fetched);
        self.rebuild_nodes();

        summary.nodes = self.snapshot.nodes.len();
        info!(
            "Refreshed {} subscriptions ({} failed): {} nodes, {} bad lines",
            summary.sources, summary.failed_sources, summary.nodes, summary.line_errors
        );
        Ok(summary)
    }

    /// Manual nodes first, then subscriptions in profile order.
    fn rebuild_nodes(&mut self) {
        let mut nodes = self.manual.clone();
        for subscription in self.profile.enabled_subscriptions() {
            if let Some(fetched) = self.fetched.get(&subscription.name) {
                nodes.extend(fetched.iter().cloned());
            }
        }
        self.snapshot.nodes = nodes;
    }

    pub fn build_json(&self) -> Result<String> {
        self.config_builder()
            .build_json()
            .context("Failed to build sing-box configuration")
    }

    /// Builds the configuration and writes it to `settings.config_path`.
    pub async fn apply(&self) -> Result<PathBuf> {
        let path = PathBuf::from(expand_tilde(&self.settings().config_path));
        self.apply_to(&path).await?;
        Ok(path)
    }

    /// Writes to a sibling temporary file first, so a failure leaves the
    /// previous configuration untouched.
    pub async fn apply_to(&self, path: &Path) -> Result<()> {
        let json = self.build_json()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace {:?}", path));
        }

        info!("Configuration written to {:?}", path);
        Ok(())
    }
}

impl Store for Manager {
    fn settings(&self) -> &Settings {
        self.snapshot.settings()
    }

    fn nodes(&self) -> &[Node] {
        self.snapshot.nodes()
    }

    fn filters(&self) -> &[Filter] {
        self.snapshot.filters()
    }

    fn rules(&self) -> &[Rule] {
        self.snapshot.rules()
    }

    fn rule_groups(&self) -> &[RuleGroup] {
        self.snapshot.rule_groups()
    }
}

async fn fetch_subscription(subscription: &Subscription) -> Result<ImportReport> {
    debug!("Refreshing subscription '{}'", subscription.name);
    let body = read_text(&subscription.url).await?;
    let report = import_subscription(&body);
    log_report(&subscription.name, &report);
    Ok(report)
}

fn log_report(source: &str, report: &ImportReport) {
    if report.failed() > 0 {
        warn!(
            "{}: imported {} nodes, {} lines failed",
            source,
            report.succeeded(),
            report.failed()
        );
    } else {
        info!("{}: imported {} nodes", source, report.succeeded());
    }
}
