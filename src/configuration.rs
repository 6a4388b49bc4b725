use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    pub fetch_limit: u32,
    pub timeout_seconds: u64,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl BackendSettings {
    pub fn new(base_url: impl Into<String>) -> BackendSettings {
        BackendSettings {
            base_url: base_url.into(),
            fetch_limit: 50,
            timeout_seconds: 10,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Reads `configuration.yaml` (optional), then `APP_*` variables, then
/// `BACKEND_URL`, each layer overriding the one before.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let builder = with_defaults(Config::builder())?
        .add_source(File::with_name("configuration").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("backend.base_url", std::env::var("BACKEND_URL").ok())?;

    builder.build()?.try_deserialize()
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("backend.base_url", "http://localhost:8000")?
        .set_default("backend.fetch_limit", 50)?
        .set_default("backend.timeout_seconds", 10)
}
