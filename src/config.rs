use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".todaily";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_HISTORY_MONTHS: u32 = 6;
const MAX_HISTORY_MONTHS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file. `None` uses `~/.todaily/db.todaily`.
    pub db_path: Option<PathBuf>,
    pub history_months: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            history_months: DEFAULT_HISTORY_MONTHS,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        default_root_dir()
            .map(|root| root.join(CONFIG_FILE))
            .context("Failed to resolve HOME directory")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.history_months = config.history_months.clamp(1, MAX_HISTORY_MONTHS);

        Ok(config)
    }

    /// A missing config file, or no home directory, means defaults. A file
    /// that exists but does not parse is an error.
    pub fn load_or_default() -> Result<Self> {
        match default_root_dir() {
            Some(root) => Self::load_or_default_from(&root.join(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                let trimmed = value.trim();
                self.db_path = (!trimmed.is_empty()).then(|| expand_home(trimmed));
            }
            "history_months" => {
                let months = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("history_months must be a number"))?;
                if !(1..=MAX_HISTORY_MONTHS).contains(&months) {
                    bail!("history_months must be between 1 and {MAX_HISTORY_MONTHS}");
                }
                self.history_months = months;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, history_months|history.months"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(
                self.db_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "default".to_string()),
            ),
            "history_months" => Some(self.history_months.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "history_months" | "history.months" => "history_months",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

/// `~/.todaily`, or `None` when the home directory cannot be resolved.
pub fn default_root_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_HISTORY_MONTHS};
    use std::path::PathBuf;

    #[test]
    fn set_and_get_with_dotted_aliases() {
        let mut config = Config::default();
        config.set_value("history.months", "12").expect("valid months");
        config.set_value("db.path", "/tmp/habits.db").expect("valid path");

        assert_eq!(config.get_value("history_months").as_deref(), Some("12"));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/habits.db")));

        config.set_value("db_path", "").expect("reset path");
        assert_eq!(config.get_value("db.path").as_deref(), Some("default"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set_value("theme", "dark").is_err());
        assert!(config.set_value("history_months", "zero").is_err());
        assert!(config.set_value("history_months", "0").is_err());
        assert_eq!(config.history_months, DEFAULT_HISTORY_MONTHS);
        assert!(config.get_value("theme").is_none());
    }

    #[test]
    fn save_and_load_round_trip_with_missing_fields_defaulted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set_value("history_months", "3").expect("valid months");
        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);

        std::fs::write(&path, "{}").expect("write partial config");
        assert_eq!(Config::load_from(&path).expect("load"), Config::default());
    }

    #[test]
    fn missing_file_is_default_but_broken_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");

        assert_eq!(
            Config::load_or_default_from(&path).expect("missing file"),
            Config::default()
        );

        std::fs::write(&path, r#"{"db_path": "/tmp/habits.db",}"#).expect("write broken config");
        let error = Config::load_or_default_from(&path).expect_err("broken file must fail");
        assert!(error.to_string().contains("Failed to parse config file"));
    }
}
