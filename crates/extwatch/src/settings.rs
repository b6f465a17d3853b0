use std::path::{Path, PathBuf};
use std::time::Duration;

use extwatch_core::gallery::DEFAULT_MARKETPLACE_URL;
use extwatch_editor::CliTimeouts;
use extwatch_platform::AppPaths;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not read settings file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_extension_id")]
    pub extension_id: String,

    #[serde(default = "default_marketplace_url")]
    pub marketplace_url: String,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,

    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_extension_id() -> String {
    "augment.vscode-augment".to_string()
}

fn default_marketplace_url() -> String {
    DEFAULT_MARKETPLACE_URL.to_string()
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_list_timeout() -> u64 {
    10
}

fn default_install_timeout() -> u64 {
    120
}

fn default_http_timeout() -> u64 {
    60
}

fn default_settle_delay() -> u64 {
    2
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            extension_id: default_extension_id(),
            marketplace_url: default_marketplace_url(),
            probe_timeout_secs: default_probe_timeout(),
            list_timeout_secs: default_list_timeout(),
            install_timeout_secs: default_install_timeout(),
            http_timeout_secs: default_http_timeout(),
            settle_delay_secs: default_settle_delay(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Settings from the per-user config directory. A missing file, or no
    /// config directory at all, yields the defaults.
    pub fn load() -> Result<Self, SettingsError> {
        let Ok(paths) = AppPaths::new() else {
            return Ok(Self::default());
        };
        Self::load_from(&paths.settings_file())
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cli_timeouts(&self) -> CliTimeouts {
        CliTimeouts {
            probe: Duration::from_secs(self.probe_timeout_secs),
            list: Duration::from_secs(self.list_timeout_secs),
            install: Duration::from_secs(self.install_timeout_secs),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AppSettings, SettingsError};

    #[test]
    fn defaults_match_expected_values() {
        let settings = AppSettings::default();

        assert_eq!(settings.extension_id, "augment.vscode-augment");
        assert_eq!(
            settings.marketplace_url,
            "https://marketplace.visualstudio.com"
        );
        assert_eq!(settings.probe_timeout_secs, 5);
        assert_eq!(settings.list_timeout_secs, 10);
        assert_eq!(settings.install_timeout_secs, 120);
        assert_eq!(settings.http_timeout_secs, 60);
        assert_eq!(settings.settle_delay_secs, 2);
        assert!(!settings.debug_logging);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: AppSettings = serde_json::from_value(json!({
            "extension_id": "github.copilot",
            "settle_delay_secs": 0
        }))
        .expect("partial settings should deserialize");

        assert_eq!(settings.extension_id, "github.copilot");
        assert_eq!(settings.settle_delay_secs, 0);
        assert_eq!(settings.list_timeout_secs, 10);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should be created");

        let settings = AppSettings::load_from(&temp.path().join("settings.json"))
            .expect("missing file should load defaults");

        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn load_from_invalid_file_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "{ not json").expect("settings file should be written");

        let error = AppSettings::load_from(&path).expect_err("invalid json should be reported");

        assert!(matches!(error, SettingsError::Invalid { .. }));
        assert!(error.to_string().contains("settings.json"));
    }

    #[test]
    fn load_from_reads_overrides() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"probe_timeout_secs": 1, "debug_logging": true}"#)
            .expect("settings file should be written");

        let settings = AppSettings::load_from(&path).expect("settings should load");

        assert!(settings.debug_logging);
        assert_eq!(settings.cli_timeouts().probe.as_secs(), 1);
        assert_eq!(settings.cli_timeouts().install.as_secs(), 120);
    }
}
