//! Client configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use sch_core::domain::Coordinates;
use sch_core::duplicates::DEFAULT_PAGE_SIZE;
use sch_core::wizard::submission::DEFAULT_DISTRICT;
use sch_core::wizard::WizardConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "smartcityhub.toml";
pub const DB_FILE_NAME: &str = "smartcityhub.sqlite";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub wizard: WizardSection,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST base URL, including the `/api` prefix
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Disable to keep raw coordinates as the address
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoder_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSection {
    /// Incidents examined by the duplicate check
    #[serde(default = "default_duplicate_page_size")]
    pub duplicate_page_size: u32,

    /// District sent when the reporter leaves it empty
    #[serde(default = "default_district")]
    pub default_district: String,
}

impl Default for WizardSection {
    fn default() -> Self {
        Self {
            duplicate_page_size: default_duplicate_page_size(),
            default_district: default_district(),
        }
    }
}

/// Fallback position for addresses the geocoder cannot place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    #[serde(default = "default_longitude")]
    pub default_longitude: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the local SQLite store; platform data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_true() -> bool { true }
fn default_api_url() -> String { sch_api::DEFAULT_BASE_URL.to_string() }
fn default_timeout_secs() -> u64 { sch_api::DEFAULT_TIMEOUT.as_secs() }
fn default_geocoder_url() -> String { sch_api::DEFAULT_GEOCODER_URL.to_string() }
fn default_duplicate_page_size() -> u32 { DEFAULT_PAGE_SIZE }
fn default_district() -> String { DEFAULT_DISTRICT.to_string() }
fn default_latitude() -> f64 { 33.5731 }
fn default_longitude() -> f64 { -7.5898 }

/// Command-line and environment values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub geocoder_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Read `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be at least 1");
        }
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(url) = overrides.api_url {
            self.api.base_url = url;
        }
        if let Some(url) = overrides.geocoder_url {
            self.geocoder.base_url = url;
        }
        if let Some(dir) = overrides.data_dir {
            self.storage.data_dir = Some(dir);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn map_centre(&self) -> Coordinates {
        Coordinates::new(self.map.default_latitude, self.map.default_longitude)
    }

    pub fn wizard_config(&self) -> WizardConfig {
        WizardConfig {
            default_district: self.wizard.default_district.clone(),
            duplicate_page_size: self.wizard.duplicate_page_size,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE_NAME)
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartcityhub")
}

/// `--config` wins; otherwise `smartcityhub.toml` in the platform config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartcityhub")
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.wizard.duplicate_page_size, 50);
        assert_eq!(config.wizard.default_district, "Downtown");
        assert!(config.geocoder.enabled);
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://hub.example.org/api"

            [wizard]
            duplicate_page_size = 20

            [map]
            default_latitude = 34.02
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://hub.example.org/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.wizard.duplicate_page_size, 20);
        assert_eq!(config.wizard.default_district, "Downtown");
        assert_eq!(config.map_centre(), Coordinates::new(34.02, -7.5898));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Config::parse("[api]\ntimeout_secs = 0\n").is_err());
        assert!(Config::parse("[api]\ntimeout_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[storage]\ndata_dir = \"/var/lib/sch\"\n").unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/sch").join(DB_FILE_NAME));

        config.apply(Overrides {
            api_url: Some("http://10.0.0.5:8080/api".to_string()),
            geocoder_url: None,
            data_dir: Some(dir.path().to_path_buf()),
        });
        assert_eq!(config.api.base_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.data_dir(), dir.path());
        assert_eq!(config.geocoder.base_url, sch_api::DEFAULT_GEOCODER_URL);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
