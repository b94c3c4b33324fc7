use std::path::PathBuf;

use anyhow::{anyhow, Context};
use bookshelf_db::DatabaseSettings;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSHELF_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSHELF";

/// Credentials the service historically read straight from the environment.
const LEGACY_DB_USER: &str = "DB_USER";
const LEGACY_DB_PASS: &str = "DB_PASS";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
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
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `BOOKSHELF_*` variables (`__` separates nested keys).
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

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = Environment::parse(&environment)?;
        settings.apply_legacy_credentials(
            std::env::var(LEGACY_DB_USER).ok(),
            std::env::var(LEGACY_DB_PASS).ok(),
        );

        Ok(settings)
    }

    /// Fill database credentials from `DB_USER` / `DB_PASS` when the layered
    /// sources left them unset.
    fn apply_legacy_credentials(&mut self, user: Option<String>, pass: Option<String>) {
        if self.database.username.is_none() {
            self.database.username = user.filter(|u| !u.is_empty());
        }
        if self.database.password.is_none() {
            self.database.password = pass.filter(|p| !p.is_empty());
        }
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

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_db::StoreBackend;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_server_listens_on_3000() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn default_database_is_virtual_book_on_mongo() {
        let settings = Settings::default();
        assert_eq!(settings.database.name, "virtualBook");
        assert_eq!(settings.database.backend, StoreBackend::Mongo);
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!(Environment::parse("qa").is_err());
        assert_eq!(
            Environment::parse("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn legacy_credentials_only_fill_gaps() {
        let mut settings = Settings::default();
        settings.database.username = Some("configured".into());

        settings.apply_legacy_credentials(Some("legacy".into()), Some("pw".into()));

        assert_eq!(settings.database.username.as_deref(), Some("configured"));
        assert_eq!(settings.database.password.as_deref(), Some("pw"));
    }

    #[test]
    fn settings_deserialize_from_nested_sources() {
        let cfg = config::Config::builder()
            .set_override("server.port", 4100)
            .unwrap()
            .set_override("database.backend", "memory")
            .unwrap()
            .set_override("telemetry.log_format", "json")
            .unwrap()
            .build()
            .unwrap();

        let settings: Settings = cfg.try_deserialize().unwrap();
        assert_eq!(settings.server.port, 4100);
        assert_eq!(settings.database.backend, StoreBackend::Memory);
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
        assert_eq!(settings.server.request_timeout_ms, 15000);
    }
}
