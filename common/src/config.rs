use serde::Deserialize;
use std::fs;

pub const ENV_STORE_URL: &str = "SUPABASE_URL";
pub const ENV_STORE_API_KEY: &str = "SUPABASE_API_KEY";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yml::Error,
    },

    #[error("invalid value for {name}: {reason}")]
    InvalidOverride { name: String, reason: String },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub server_address: String,
    pub log_level: String,
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            cors_origin: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Local path or http(s) URL of the model artifact
    pub source: String,
    #[serde(default)]
    pub scaler: Option<String>,
    #[serde(default = "default_feature_schema")]
    pub feature_schema: String,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            scaler: None,
            feature_schema: default_feature_schema(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CutPointConfig {
    pub above: f64,
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub cut_points: Vec<CutPointConfig>,
    #[serde(default)]
    pub floor_label: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            cut_points: Vec::new(),
            floor_label: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: default_table(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl NotifierConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

fn default_feature_schema() -> String {
    "enriched".to_string()
}

fn default_scheme() -> String {
    "three_tier".to_string()
}

fn default_table() -> String {
    "customers".to_string()
}

fn default_download_timeout() -> u64 {
    30
}

fn default_notify_timeout() -> u64 {
    5
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
            path: config_path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents, config_path)
    }

    pub fn from_yaml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Applies `SUPABASE_URL`, `SUPABASE_API_KEY` and `PORT` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL) {
            tracing::debug!("Record store URL taken from {}", ENV_STORE_URL);
            self.notifier.base_url = url;
        }
        if let Some(key) = lookup(ENV_STORE_API_KEY) {
            tracing::debug!("Record store API key taken from {}", ENV_STORE_API_KEY);
            self.notifier.api_key = key;
        }
        if let Some(port) = lookup(ENV_PORT) {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                name: ENV_PORT.to_string(),
                reason: format!("'{}' is not a valid port", port),
            })?;
            let host = self
                .service
                .server_address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            self.service.server_address = format!("{}:{}", host, port);
        }
        Ok(())
    }
}
