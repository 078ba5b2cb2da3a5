use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Experimental features configuration for sing-box
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Experimental {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clash_api: Option<ClashApi>,

    /// Cache file configuration (since 1.8.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<CacheFile>,
}

/// Cache file configuration (since 1.8.0)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheFile {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Path to the cache file (default: "cache.db")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Clash API configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClashApi {
    /// RESTful web API listening address. Clash API is disabled if empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_controller: Option<String>,

    /// Directory with static web resources, served at `http://{{external-controller}}/ui`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ui: Option<String>,

    /// ZIP download URL for the external UI, used if `external_ui` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ui_download_url: Option<String>,

    /// Sent by clients as `Authorization: Bearer ${secret}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Default mode in Clash (default: "Rule")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experimental_default_serializes_empty() {
        assert_eq!(serde_json::to_string(&Experimental::default()).unwrap(), "{}");
    }

    #[test]
    fn test_clash_api_before_cache_file() {
        let experimental = Experimental {
            clash_api: Some(ClashApi {
                external_controller: Some("127.0.0.1:9091".to_string()),
                default_mode: Some("rule".to_string()),
                ..Default::default()
            }),
            cache_file: Some(CacheFile {
                enabled: true,
                path: Some("cache.db".to_string()),
            }),
        };
        let json = serde_json::to_string(&experimental).unwrap();
        assert_eq!(
            json,
            r#"{"clash_api":{"external_controller":"127.0.0.1:9091","default_mode":"rule"},"cache_file":{"enabled":true,"path":"cache.db"}}"#
        );
    }
}
