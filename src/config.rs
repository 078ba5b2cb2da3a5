use serde::{Deserialize, Serialize};

use crate::config::dns::Dns;
use crate::config::experimental::Experimental;
use crate::config::inbound::Inbound;
use crate::config::log::Log;
use crate::config::ntp::Ntp;
use crate::config::outbound::Outbound;
use crate::config::route::Route;

pub mod dns;
pub mod experimental;
pub mod inbound;
pub mod log;
pub mod ntp;
pub mod outbound;
pub mod route;
pub mod shared;
pub mod util;

/// Main sing-box configuration structure
///
/// Sections that are not set are omitted from the serialized document, so
/// the output carries exactly the keys the generator filled in.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SingBoxConfig {
    #[serde(default, skip_serializing_if = "is_default_log")]
    pub log: Log,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntp: Option<Ntp>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbounds: Vec<Inbound>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<Outbound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Experimental>,
}

fn is_default_log(log: &Log) -> bool {
    *log == Log::default()
}

impl SingBoxConfig {
    pub fn builder() -> SingBoxConfigBuilder {
        SingBoxConfigBuilder::default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up an outbound by tag.
    pub fn outbound(&self, tag: &str) -> Option<&Outbound> {
        self.outbounds.iter().find(|o| o.tag() == tag)
    }
}

/// Builder for SingBoxConfig
#[derive(Default)]
pub struct SingBoxConfigBuilder {
    config: SingBoxConfig,
}

impl SingBoxConfigBuilder {
    pub fn log(mut self, log: Log) -> Self {
        self.config.log = log;
        self
    }

    pub fn dns(mut self, dns: Dns) -> Self {
        self.config.dns = Some(dns);
        self
    }

    pub fn ntp(mut self, ntp: Ntp) -> Self {
        self.config.ntp = Some(ntp);
        self
    }

    pub fn inbounds(mut self, inbounds: Vec<Inbound>) -> Self {
        self.config.inbounds = inbounds;
        self
    }

    pub fn outbound(mut self, outbound: Outbound) -> Self {
        self.config.outbounds.push(outbound);
        self
    }

    pub fn outbounds(mut self, outbounds: Vec<Outbound>) -> Self {
        self.config.outbounds = outbounds;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.config.route = Some(route);
        self
    }

    pub fn experimental(mut self, experimental: Option<Experimental>) -> Self {
        self.config.experimental = experimental;
        self
    }

    pub fn build(self) -> SingBoxConfig {
        self.config
    }
}
