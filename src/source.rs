//! Reading profiles and subscription bodies from disk or over HTTP.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::get_version;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = home_dir()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

fn home_dir() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

// ============================================================================
// Reading
// ============================================================================

/// Text at `location`: fetched when it is an http(s) URL, read from disk
/// otherwise.
pub async fn read_text(location: &str) -> Result<String> {
    if is_remote(location) {
        return fetch_text(location).await;
    }

    let path = expand_tilde(location);
    tokio::fs::read_to_string(Path::new(&path))
        .await
        .with_context(|| format!("Failed to read {}", path))
}

/// Fetch text content from a URL
pub async fn fetch_text(url: &str) -> Result<String> {
    debug!("Fetching URL: {}", url);

    let client = reqwest::Client::builder()
        .user_agent(format!("sbm/{}", get_version()))
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch URL: {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP request failed with status {}: {}", status, url);
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from: {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_expand_tilde_with_home() {
        if let Ok(home) = env::var("HOME") {
            let expanded = expand_tilde("~/profiles/home.toml");
            assert!(expanded.starts_with(&home));
            assert!(expanded.ends_with("/profiles/home.toml"));
            assert!(!expanded.contains('~'));
        }
    }

    #[test]
    fn test_expand_tilde_leaves_other_paths() {
        assert_eq!(expand_tilde("/etc/sbm/profile.toml"), "/etc/sbm/profile.toml");
        assert_eq!(expand_tilde("./profile.toml"), "./profile.toml");
        // Only a leading tilde expands
        assert_eq!(expand_tilde("/srv/~/profile.toml"), "/srv/~/profile.toml");
        assert_eq!(expand_tilde("~user/profile.toml"), "~user/profile.toml");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://sub.example.com/link"));
        assert!(is_remote("http://127.0.0.1:8080/sub"));
        assert!(!is_remote("subs/airport.txt"));
        assert!(!is_remote("ftp://example.com/sub"));
    }

    #[tokio::test]
    async fn test_read_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.txt");
        std::fs::write(&path, "trojan://pw@example.com:443#A\n").unwrap();

        let text = read_text(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "trojan://pw@example.com:443#A\n");
    }

    #[tokio::test]
    async fn test_read_text_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = read_text(path.to_str().unwrap()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }
}
