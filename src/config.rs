use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OmicsError;
use crate::retry::{DEFAULT_MAX_RETRIES, DEFAULT_PAUSE_SECS, RetryPolicy};

pub const DEFAULT_CONFIG_FILE: &str = "kira-omics.json";
pub const DEFAULT_CGDS_BASE_URL: &str = "http://www.cbioportal.org/public-portal/webservice.do?";
pub const DEFAULT_HPA_URL_TEMPLATE: &str =
    "http://v{version}.proteinatlas.org/download/proteinatlas.tab.gz";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_STUDY_MARKER: &str = "tcga";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cgds_base_url: Option<String>,
    #[serde(default)]
    pub hpa_url_template: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_pause_secs: Option<u64>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub study_marker: Option<String>,
}

/// Immutable settings resolved once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cgds_base_url: String,
    pub hpa_url_template: String,
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub study_marker: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cgds_base_url: DEFAULT_CGDS_BASE_URL.to_string(),
            hpa_url_template: DEFAULT_HPA_URL_TEMPLATE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            http_timeout: Duration::from_secs(120),
            study_marker: DEFAULT_STUDY_MARKER.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-omics.json` from the working directory when it
    /// exists; otherwise defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<Settings, OmicsError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| OmicsError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| OmicsError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<Settings, OmicsError> {
        let batch_size = config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(OmicsError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if let Some(template) = &config.hpa_url_template {
            if !template.contains("{version}") {
                return Err(OmicsError::Validation(format!(
                    "hpa_url_template must contain a {{version}} placeholder: {template}"
                )));
            }
        }

        Ok(Settings {
            cgds_base_url: config
                .cgds_base_url
                .unwrap_or_else(|| DEFAULT_CGDS_BASE_URL.to_string()),
            hpa_url_template: config
                .hpa_url_template
                .unwrap_or_else(|| DEFAULT_HPA_URL_TEMPLATE.to_string()),
            batch_size,
            retry: RetryPolicy {
                max_retries: config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                pause: Duration::from_secs(config.retry_pause_secs.unwrap_or(DEFAULT_PAUSE_SECS)),
            },
            http_timeout: Duration::from_secs(config.http_timeout_secs.unwrap_or(120)),
            study_marker: config
                .study_marker
                .unwrap_or_else(|| DEFAULT_STUDY_MARKER.to_string()),
        })
    }
}
