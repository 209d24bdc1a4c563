use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

/// Configuration for a single provider: credential plus optional endpoint overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Replaces the provider's default API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name shown in reports and messages instead of the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// WeatherUnderground only: city autocomplete endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweathermap" or "wunderground".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweathermap]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `weatherscope configure <provider>` \
                 (e.g. `weatherscope configure openweathermap`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherscope", "weatherscope")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key, keeping any endpoint overrides, and make
    /// it the default if none is set yet.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = api_key;

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider");
        assert_eq!(default, ProviderId::OpenWeatherMap);

        let key = cfg.provider_api_key(ProviderId::OpenWeatherMap);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeatherMap));
        assert!(!cfg.is_provider_configured(ProviderId::DarkSky));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::WeatherUnderground, "WU_KEY".into());

        let default = cfg.default_provider_id().expect("default provider");

        assert_eq!(default, ProviderId::OpenWeatherMap);
        assert!(cfg.is_provider_configured(ProviderId::OpenWeatherMap));
        assert!(cfg.is_provider_configured(ProviderId::WeatherUnderground));
    }

    #[test]
    fn upsert_keeps_endpoint_overrides() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::DarkSky, "OLD".into());
        cfg.providers.get_mut("darksky").unwrap().base_url = Some("http://localhost:9".into());

        cfg.upsert_provider_api_key(ProviderId::DarkSky, "NEW".into());

        let settings = cfg.provider_config(ProviderId::DarkSky).unwrap();
        assert_eq!(settings.api_key, "NEW");
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9"));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::DarkSky, "DS_KEY".into());

        cfg.set_default_provider(ProviderId::DarkSky);

        let default = cfg.default_provider_id().expect("default provider");
        assert_eq!(default, ProviderId::DarkSky);
    }

    #[test]
    fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherUnderground, "WU_KEY".into());
        cfg.providers.get_mut("wunderground").unwrap().autocomplete_url =
            Some("http://localhost:8080/aq".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        let id = loaded.default_provider_id().unwrap();
        assert_eq!(id, ProviderId::WeatherUnderground);

        let settings = loaded.provider_config(id).unwrap();
        assert_eq!(settings.api_key, "WU_KEY");
        assert_eq!(
            settings.autocomplete_url.as_deref(),
            Some("http://localhost:8080/aq")
        );
        assert_eq!(settings.display_name, None);
    }

    #[test]
    fn parses_hand_written_toml() {
        let cfg: Config = toml::from_str(
            r#"
            default_provider = "darksky"

            [providers.darksky]
            api_key = "abc"
            display_name = "Provider-A"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::DarkSky);
        let settings = cfg.provider_config(ProviderId::DarkSky).unwrap();
        assert_eq!(settings.display_name.as_deref(), Some("Provider-A"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_provider = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
