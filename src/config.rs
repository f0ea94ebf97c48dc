use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{Result, StudioError};
use crate::locale::Locale;
use crate::state::history::DEFAULT_HISTORY_LIMIT;
use crate::state::session::{DEFAULT_IMAGE_COUNT, DEFAULT_VIDEO_MODEL, MAX_IMAGE_COUNT};

const APP_DIR_NAME: &str = "archviz-studio";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "ARCHVIZ_CONFIG_PATH";
const ENV_SERVICE_URL: &str = "ARCHVIZ_SERVICE_URL";
const ENV_API_KEY: &str = "ARCHVIZ_API_KEY";
const ENV_LOCALE: &str = "ARCHVIZ_LOCALE";
const ENV_HISTORY_LIMIT: &str = "ARCHVIZ_HISTORY_LIMIT";

const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    service_url: String,
    api_key: Option<String>,
    locale: Locale,
    history_limit: usize,
    default_image_count: u8,
    video_model: String,
    request_timeout: Duration,
}

impl AppConfig {
    /// Defaults, then the config file, then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let path = match config_file_override() {
            Some(path) => Some(path),
            None => Self::default_config_path().ok(),
        };
        if let Some(path) = path.filter(|p| p.exists()) {
            let partial = read_partial(&path)?;
            config.apply_partial(partial);
            tracing::info!("⚙️  Loaded config from {}", path.display());
        }

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn default_image_count(&self) -> u8 {
        self.default_image_count
    }

    pub fn video_model(&self) -> &str {
        &self.video_model
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| StudioError::Config("unable to determine config directory".into()))?;
        Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(url) = partial.service_url {
            self.service_url = url;
        }
        if let Some(key) = partial.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(locale) = partial.locale {
            self.locale = locale;
        }
        if let Some(limit) = partial.history_limit {
            self.history_limit = limit.max(1);
        }
        if let Some(count) = partial.default_image_count {
            self.default_image_count = count.clamp(1, MAX_IMAGE_COUNT);
        }
        if let Some(model) = partial.video_model {
            self.video_model = model;
        }
        if let Some(secs) = partial.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs.max(1));
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = var(ENV_SERVICE_URL).filter(|v| !v.trim().is_empty()) {
            self.service_url = value;
        }
        if let Some(value) = var(ENV_API_KEY) {
            self.api_key = Some(value).filter(|v| !v.trim().is_empty());
        }
        if let Some(value) = var(ENV_LOCALE).filter(|v| !v.trim().is_empty()) {
            self.locale = Locale::from_code(&value)
                .ok_or_else(|| StudioError::Config(format!("{ENV_LOCALE} must be 'en' or 'vi', got '{value}'")))?;
        }
        if let Some(value) = var(ENV_HISTORY_LIMIT).filter(|v| !v.trim().is_empty()) {
            let limit = value
                .trim()
                .parse::<usize>()
                .map_err(|_| StudioError::Config(format!("{ENV_HISTORY_LIMIT} must be a positive integer")))?;
            self.history_limit = limit.max(1);
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.into(),
            api_key: None,
            locale: Locale::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_image_count: DEFAULT_IMAGE_COUNT,
            video_model: DEFAULT_VIDEO_MODEL.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn config_file_override() -> Option<PathBuf> {
    let value = env::var_os(ENV_CONFIG_PATH).filter(|v| !v.is_empty())?;
    let path = PathBuf::from(value);
    if path.is_dir() {
        return Some(path.join(CONFIG_FILE_NAME));
    }
    Some(path)
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents)
        .map_err(|e| StudioError::Config(format!("failed to parse {}: {e}", path.display())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    service_url: Option<String>,
    api_key: Option<String>,
    locale: Option<Locale>,
    history_limit: Option<usize>,
    default_image_count: Option<u8>,
    video_model: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "service_url = \"https://render.example.com\"\nlocale = \"vi\"\ndefault_image_count = 9\nrequest_timeout_secs = 30\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.apply_partial(read_partial(&path).unwrap());
        assert_eq!(config.service_url(), "https://render.example.com");
        assert_eq!(config.locale(), Locale::Vi);
        assert_eq!(config.default_image_count(), MAX_IMAGE_COUNT);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));

        config
            .apply_env(env_of(&[
                (ENV_LOCALE, "en"),
                (ENV_API_KEY, "secret"),
                (ENV_HISTORY_LIMIT, "50"),
            ]))
            .unwrap();
        assert_eq!(config.locale(), Locale::En);
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.history_limit(), 50);
    }

    #[test]
    fn test_bad_env_values_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env_of(&[(ENV_LOCALE, "klingon")])).is_err());
        assert!(config.apply_env(env_of(&[(ENV_HISTORY_LIMIT, "lots")])).is_err());
    }

    #[test]
    fn test_unknown_keys_fail_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(matches!(read_partial(&path), Err(StudioError::Config(_))));
    }
}
