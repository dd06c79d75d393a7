use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::secrets::SecretSource;
use crate::webhook::WebhookEndpoint;

pub const DEFAULT_PUBLISH_BASE_URL: &str = "https://example.com/articles";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub storage_directory: Option<String>,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            storage_directory: None,
            webhooks: WebhooksConfig::default(),
            publish: PublishConfig::default(),
            recovery: RecoveryConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Configured database file, else `~/.medpub/data/medpub.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(crate::secrets::expand_home(path))),
            None => crate::db::default_database_path(),
        }
    }

    /// Configured image root, else `~/.medpub/objects`.
    pub fn storage_directory(&self) -> Option<PathBuf> {
        match &self.storage_directory {
            Some(path) => Some(PathBuf::from(crate::secrets::expand_home(path))),
            None => dirs::home_dir().map(|h| h.join(".medpub").join("objects")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhooksConfig {
    #[serde(default)]
    pub analyze_url: Option<String>,
    #[serde(default)]
    pub generate_report_url: Option<String>,
    #[serde(default)]
    pub generate_article_url: Option<String>,
    #[serde(default)]
    pub publish_article_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(flatten)]
    pub token: SecretSource,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            analyze_url: None,
            generate_report_url: None,
            generate_article_url: None,
            publish_article_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            token: SecretSource::default(),
        }
    }
}

impl WebhooksConfig {
    pub fn url(&self, endpoint: WebhookEndpoint) -> Option<&str> {
        let url = match endpoint {
            WebhookEndpoint::Analyze => &self.analyze_url,
            WebhookEndpoint::GenerateReport => &self.generate_report_url,
            WebhookEndpoint::GenerateArticle => &self.generate_article_url,
            WebhookEndpoint::PublishArticle => &self.publish_article_url,
        };
        url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn url_mut(&mut self, endpoint: WebhookEndpoint) -> &mut Option<String> {
        match endpoint {
            WebhookEndpoint::Analyze => &mut self.analyze_url,
            WebhookEndpoint::GenerateReport => &mut self.generate_report_url,
            WebhookEndpoint::GenerateArticle => &mut self.generate_article_url,
            WebhookEndpoint::PublishArticle => &mut self.publish_article_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_publish_base_url")]
    pub fallback_base_url: String,
}

fn default_publish_base_url() -> String {
    DEFAULT_PUBLISH_BASE_URL.to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            fallback_base_url: default_publish_base_url(),
        }
    }
}

/// Stale `analyzing` sweep. Off unless `stale_analysis_secs` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub stale_analysis_secs: Option<u64>,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            stale_analysis_secs: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RecoveryConfig {
    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_analysis_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: Option<String>,
}
