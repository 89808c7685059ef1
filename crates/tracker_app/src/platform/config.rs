//! Dashboard configuration, read from a RON file.
//!
//! `tracker.ron` in the working directory unless `TRACKER_CONFIG` names
//! another file. A missing file means defaults; an unreadable one also means
//! defaults, plus a warning once logging is up.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracker_engine::ApiSettings;
use tracker_logging::LogDestination;

pub(crate) const CONFIG_FILENAME: &str = "tracker.ron";
pub(crate) const CONFIG_ENV: &str = "TRACKER_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub state_dir: PathBuf,
    pub log_destination: LogTarget,
    pub poll_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            state_dir: PathBuf::from(".tracker_state"),
            log_destination: LogTarget::File,
            poll_interval_ms: 5_000,
            tick_interval_ms: 250,
            request_timeout_ms: api.request_timeout.as_millis() as u64,
            connect_timeout_ms: api.connect_timeout.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }
}

pub(crate) struct LoadedConfig {
    pub config: AppConfig,
    /// Why defaults were used instead of the file, if they were.
    pub warning: Option<String>,
}

pub(crate) fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

pub(crate) fn load() -> LoadedConfig {
    let path = config_path();
    match read_config(&path) {
        Ok(Some(config)) => LoadedConfig {
            config,
            warning: None,
        },
        Ok(None) => LoadedConfig {
            config: AppConfig::default(),
            warning: None,
        },
        Err(err) => LoadedConfig {
            config: AppConfig::default(),
            warning: Some(format!("{err:#}")),
        },
    }
}

/// `Ok(None)` when the file does not exist.
pub(crate) fn read_config(path: &Path) -> anyhow::Result<Option<AppConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_config(&temp.path().join("tracker.ron")).unwrap(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tracker.ron");
        fs::write(
            &path,
            r#"(base_url: "http://tracker.local:8080/", log_destination: Both)"#,
        )
        .unwrap();

        let config = read_config(&path).unwrap().unwrap();
        assert_eq!(config.base_url, "http://tracker.local:8080/");
        assert_eq!(config.log_destination, LogTarget::Both);
        assert_eq!(config.poll_interval_ms, AppConfig::default().poll_interval_ms);
        assert_eq!(
            config.api_settings().request_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tracker.ron");
        fs::write(&path, "(base_url: ").unwrap();
        assert!(read_config(&path).is_err());
    }
}
