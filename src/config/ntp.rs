use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Built-in NTP client. Provides time for TLS and the AEAD protocols on
/// hosts whose clock cannot be trusted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Ntp {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// NTP server address (required when enabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// NTP server port (default: 123)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// Time synchronization interval (default: "30m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

impl Ntp {
    pub fn with_server(server: impl Into<String>) -> Self {
        Self {
            enabled: true,
            server: Some(server.into()),
            ..Default::default()
        }
    }
}
