use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKCLUB_ENV";
const CONFIG_DIR_ENV: &str = "BOOKCLUB_CONFIG_DIR";

/// Deployment environment the bot is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let environment_enum = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("BOOKCLUB")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = environment_enum;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Chat platform REST credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "PlatformSettings::default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub bot_token: String,
    /// Hex-encoded Ed25519 key that signs interaction callbacks
    #[serde(default)]
    pub public_key: String,
}

impl PlatformSettings {
    fn default_api_base() -> String {
        "https://discord.com/api/v10".to_string()
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            application_id: String::new(),
            bot_token: String::new(),
            public_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "StorageSettings::default_state_path")]
    pub state_path: PathBuf,
}

impl StorageSettings {
    fn default_state_path() -> PathBuf {
        PathBuf::from("./server_state.json")
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_path: Self::default_state_path(),
        }
    }
}

/// Book metadata provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupSettings {
    #[serde(default = "LookupSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "LookupSettings::default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "LookupSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl LookupSettings {
    fn default_base_url() -> String {
        "https://openlibrary.org".to_string()
    }

    fn default_search_limit() -> usize {
        5
    }

    fn default_timeout_ms() -> u64 {
        10000
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            search_limit: Self::default_search_limit(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GatewaySettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_state_path_is_server_state_json() {
        let settings = Settings::default();
        assert_eq!(
            settings.storage.state_path,
            PathBuf::from("./server_state.json")
        );
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(Environment::parse("qa").is_err());
        assert_eq!(
            Environment::parse("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn base_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("bookclub-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("base.toml"),
            "[server]\nport = 4000\n\n[lookup]\nsearch_limit = 3\n",
        )
        .unwrap();

        let settings = Settings::load_from(&dir, "local").unwrap();
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.lookup.search_limit, 3);
        assert_eq!(settings.server.host, "0.0.0.0");

        std::fs::remove_dir_all(&dir).ok();
    }
}
