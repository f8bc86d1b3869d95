use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::client::StarrClient;
use crate::error::{Result, StarrError};

/// Parse a human readable duration such as `30s`, `1m 30s` or `500ms`.
pub fn parse_duration(text: &str) -> Result<Duration> {
    text.trim()
        .parse::<humantime::Duration>()
        .map(Duration::from)
        .map_err(|e| StarrError::Config(format!("Invalid duration '{text}': {e}")))
}

/// Connection settings for one server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub url: String,
    pub api_key: String,
    /// Basic-auth credentials for a reverse proxy
    pub http_user: String,
    pub http_pass: String,
    /// Form login credentials
    pub username: String,
    pub password: String,
    pub timeout: String,
    pub verify_ssl: bool,
    pub app: Option<App>,
    pub logging: LoggingSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8989".to_string(),
            api_key: String::new(),
            http_user: String::new(),
            http_pass: String::new(),
            username: String::new(),
            password: String::new(),
            timeout: "30s".to_string(),
            verify_ssl: true,
            app: None,
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String, // "json" or "pretty"
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ClientSettings {
    /// Load settings with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // STARR__API_KEY, STARR__LOGGING__LEVEL, etc.
        builder = builder.add_source(
            Environment::with_prefix("STARR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .and_then(ConfigBuilder::try_deserialize)
            .map_err(|e| StarrError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        Self::load(Some(path))
    }

    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(StarrError::Config("url must not be empty".to_string()));
        }
        url::Url::parse(&self.url).map_err(|source| StarrError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        self.timeout()?;
        Ok(())
    }
}

impl StarrClient {
    /// Build a client with a default HTTP client from loaded settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        settings.validate()?;
        Self::builder(&settings.url)
            .api_key(&settings.api_key)
            .http_auth(&settings.http_user, &settings.http_pass)
            .login(&settings.username, &settings.password)
            .timeout(settings.timeout()?)
            .verify_ssl(settings.verify_ssl)
            .build()
    }
}
