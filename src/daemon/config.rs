//! Daemon configuration loaded from `.minder/daemon.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// How often the daemon scans for due reminders (seconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Minutes a snooze pushes an overdue occurrence into the future.
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: i64,

    /// Seconds before an unacknowledged notification is raised again.
    /// 0 disables re-prompting.
    #[serde(default = "default_reprompt_delay")]
    pub reprompt_delay_secs: u64,

    /// Path to the reminders file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Path to the events JSONL file consumed by other tools.
    #[serde(default = "default_events_path")]
    pub events_path: PathBuf,

    /// External command to deliver notifications. When unset, notifications
    /// go to the daemon's stderr.
    #[serde(default)]
    pub notify_command: Option<String>,
}

fn default_tick_interval() -> u64 {
    30
}

fn default_snooze_minutes() -> i64 {
    5
}

fn default_reprompt_delay() -> u64 {
    300
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".minder/reminders.json")
}

fn default_events_path() -> PathBuf {
    PathBuf::from(".minder/events.jsonl")
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            snooze_minutes: default_snooze_minutes(),
            reprompt_delay_secs: default_reprompt_delay(),
            store_path: default_store_path(),
            events_path: default_events_path(),
            notify_command: None,
        }
    }
}

impl DaemonConfig {
    /// Load config from `.minder/daemon.toml` under the given data root.
    /// A missing file yields the defaults.
    pub fn load(data_root: &Path) -> color_eyre::Result<Self> {
        let path = data_root.join(".minder/daemon.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(color_eyre::eyre::eyre!(
                    "failed to read {}: {e}",
                    path.display()
                ));
            }
        };
        let config: DaemonConfig = toml::from_str(&content)
            .map_err(|e| color_eyre::eyre::eyre!("failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Resolve the reminders file path relative to the data root.
    pub fn resolved_store_path(&self, data_root: &Path) -> PathBuf {
        resolve(&self.store_path, data_root)
    }

    /// Resolve the events file path relative to the data root.
    pub fn resolved_events_path(&self, data_root: &Path) -> PathBuf {
        resolve(&self.events_path, data_root)
    }
}

fn resolve(path: &Path, data_root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
tick_interval_secs = 10
snooze_minutes = 15
reprompt_delay_secs = 120
store_path = "/tmp/reminders.json"
events_path = "/tmp/events.jsonl"
notify_command = "/usr/local/bin/minder-notify"
"#;
        let config: DaemonConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tick_interval_secs, 10);
        assert_eq!(config.snooze_minutes, 15);
        assert_eq!(config.reprompt_delay_secs, 120);
        assert_eq!(config.store_path, PathBuf::from("/tmp/reminders.json"));
        assert_eq!(config.events_path, PathBuf::from("/tmp/events.jsonl"));
        assert_eq!(
            config.notify_command.as_deref(),
            Some("/usr/local/bin/minder-notify")
        );
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.tick_interval_secs, 30);
        assert_eq!(config.snooze_minutes, 5);
        assert_eq!(config.reprompt_delay_secs, 300);
        assert_eq!(config.store_path, PathBuf::from(".minder/reminders.json"));
        assert_eq!(config.events_path, PathBuf::from(".minder/events.jsonl"));
        assert!(config.notify_command.is_none());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load(dir.path()).unwrap();
        assert_eq!(config.tick_interval_secs, 30);
    }

    #[test]
    fn test_load_bad_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let minder = dir.path().join(".minder");
        std::fs::create_dir_all(&minder).unwrap();
        std::fs::write(minder.join("daemon.toml"), "tick_interval_secs = \"soon\"").unwrap();
        assert!(DaemonConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_resolved_store_path_relative() {
        let config = DaemonConfig::default();
        let resolved = config.resolved_store_path(Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data/.minder/reminders.json"));
    }

    #[test]
    fn test_resolved_store_path_absolute() {
        let config: DaemonConfig = toml::from_str(r#"store_path = "/abs/reminders.json""#).unwrap();
        let resolved = config.resolved_store_path(Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/abs/reminders.json"));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<DaemonConfig, _> = toml::from_str("bogus_field = true");
        assert!(result.is_err());
    }
}
