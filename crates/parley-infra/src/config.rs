//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default) and
//! deserializes it into [`AppConfig`]. Falls back to defaults when the file is
//! missing or malformed, then applies `PARLEY_*` environment overrides.

use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Duration;
use secrecy::SecretString;

use parley_types::config::AppConfig;

use crate::sqlite::pool::database_url_in;

pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";
pub const DATABASE_URL_ENV: &str = "PARLEY_DATABASE_URL";
pub const JWT_SECRET_ENV: &str = "PARLEY_JWT_SECRET";

/// Data directory: `PARLEY_DATA_DIR` if set, else `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: a warning, then defaults.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Overlay environment variables on a loaded config. `lookup` is
/// `std::env::var` in production.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
        config.database.url = Some(url);
    }
    if let Some(secret) = lookup(JWT_SECRET_ENV).filter(|v| !v.is_empty()) {
        config.auth.jwt_secret = Some(secret);
    }
    config
}

/// Database URL from config, else `parley.db` in the data directory.
pub fn resolve_database_url(config: &AppConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| database_url_in(data_dir))
}

/// Token signing secret. Without a configured one, a random secret is
/// generated for this process and every token dies with it.
pub fn resolve_jwt_secret(config: &AppConfig) -> SecretString {
    match config.auth.jwt_secret.as_deref() {
        Some(secret) if !secret.is_empty() => SecretString::from(secret.to_string()),
        _ => {
            tracing::warn!(
                "No JWT secret configured (set {JWT_SECRET_ENV} or auth.jwt_secret); \
                 using a random per-process secret"
            );
            SecretString::from(random_secret())
        }
    }
}

/// Access token lifetime, at least one minute.
pub fn access_token_ttl(config: &AppConfig) -> Duration {
    Duration::minutes(config.auth.access_token_ttl_minutes.max(1))
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.pagination.per_page, 20);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
host = "0.0.0.0"
port = 8080

[auth]
jwt_secret = "from-file"
access_token_ttl_minutes = 15
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-file"));
        assert_eq!(config.auth.access_token_ttl_minutes, 15);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("from-file".to_string());

        let config = apply_env_overrides(config, |key| match key {
            JWT_SECRET_ENV => Some("from-env".to_string()),
            DATABASE_URL_ENV => Some("sqlite::memory:".to_string()),
            _ => None,
        });
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = apply_env_overrides(AppConfig::default(), |_| Some(String::new()));
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.database.url.is_none());
    }

    #[test]
    fn database_url_defaults_to_data_dir() {
        let config = AppConfig::default();
        let url = resolve_database_url(&config, Path::new("/srv/parley"));
        assert_eq!(url, "sqlite:///srv/parley/parley.db");
    }

    #[test]
    fn jwt_secret_falls_back_to_random() {
        let mut config = AppConfig::default();
        let a = resolve_jwt_secret(&config);
        let b = resolve_jwt_secret(&config);
        assert_eq!(a.expose_secret().len(), 64);
        assert_ne!(a.expose_secret(), b.expose_secret());

        config.auth.jwt_secret = Some("configured".to_string());
        assert_eq!(resolve_jwt_secret(&config).expose_secret(), "configured");
    }

    #[test]
    fn token_ttl_has_a_floor() {
        let mut config = AppConfig::default();
        assert_eq!(access_token_ttl(&config), Duration::minutes(60));
        config.auth.access_token_ttl_minutes = 0;
        assert_eq!(access_token_ttl(&config), Duration::minutes(1));
    }
}
