//! Persistent application settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spamslam_core::classifier::{CandidateQuery, DEFAULT_MAX_RESULTS, DEFAULT_SINCE_DAYS};
use spamslam_core::scan::{DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE};
use spamslam_core::{ActionPolicy, Identity, ScanPolicy};
use spamslam_google::openai::{DEFAULT_MODEL, DEFAULT_PROXY_URL, DEFAULT_TEMPERATURE};
use tracing::{debug, info};

const APP_DIR: &str = "spamslam";
const SETTINGS_FILE: &str = "settings.json";
const DATABASE_FILE: &str = "spamslam.db";

/// Settings that persist across invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the chat-completions proxy.
    pub ai_proxy_url: String,
    /// Model requested from the proxy.
    pub ai_model: String,
    /// Sampling temperature.
    pub ai_temperature: f64,
    /// Scan tuning.
    pub scan: ScanSettings,
    /// Pause between AI calls in a bulk action.
    pub action_pause_ms: u64,
    /// The connected account, if any.
    pub active_identity: Option<Identity>,
}

/// Scan tuning, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Only messages newer than this many days.
    pub since_days: u32,
    /// Cap on listed messages.
    pub max_results: u32,
    /// Concurrent fetches per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_proxy_url: DEFAULT_PROXY_URL.to_string(),
            ai_model: DEFAULT_MODEL.to_string(),
            ai_temperature: DEFAULT_TEMPERATURE,
            scan: ScanSettings::default(),
            action_pause_ms: 150,
            active_identity: None,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            since_days: DEFAULT_SINCE_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: u64::try_from(DEFAULT_BATCH_PAUSE.as_millis()).unwrap_or(150),
        }
    }
}

impl Settings {
    /// Scan policy derived from these settings.
    #[must_use]
    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy {
            query: CandidateQuery {
                since_days: self.scan.since_days,
                max_results: self.scan.max_results,
                ..CandidateQuery::default()
            },
            batch_size: self.scan.batch_size.max(1),
            batch_pause: Duration::from_millis(self.scan.batch_pause_ms),
        }
    }

    /// Action policy derived from these settings.
    #[must_use]
    pub const fn action_policy(&self) -> ActionPolicy {
        ActionPolicy {
            pause: Duration::from_millis(self.action_pause_ms),
        }
    }
}

/// `<config dir>/spamslam/settings.json`.
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE)
}

/// `<data dir>/spamslam/spamslam.db`.
pub fn database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(DATABASE_FILE)
}

/// Loads settings, falling back to defaults when the file does not exist.
pub async fn load(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(Settings::default());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Invalid settings in {}", path.display()))
}

/// Writes settings, creating the parent directory.
pub async fn save(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "Settings saved");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("spamslam-test-{}-{name}", std::process::id()))
            .join(SETTINGS_FILE)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        let policy = settings.scan_policy();

        assert_eq!(settings.ai_model, "gpt-4o-mini");
        assert_eq!(policy.batch_size, 60);
        assert_eq!(policy.query.max_results, 900);
        assert_eq!(policy.query.since_days, 365);
        assert_eq!(settings.action_policy().pause, Duration::from_millis(150));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"ai_model": "gpt-4o", "scan": {"batch_size": 10}}"#).unwrap();

        assert_eq!(settings.ai_model, "gpt-4o");
        assert_eq!(settings.scan.batch_size, 10);
        assert_eq!(settings.scan.max_results, 900);
        assert_eq!(settings.ai_proxy_url, DEFAULT_PROXY_URL);
        assert!(settings.active_identity.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let settings = load(&scratch_path("missing")).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let path = scratch_path("roundtrip");
        let settings = Settings {
            active_identity: Some(Identity::new("me@gmail.com")),
            ..Settings::default()
        };

        save(&path, &settings).await.unwrap();
        let loaded = load(&path).await.unwrap();

        assert_eq!(loaded, settings);
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
