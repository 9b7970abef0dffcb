// src/config.rs
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
    /// Subscription window granted on registration.
    #[serde(default = "default_subscription_days")]
    pub default_subscription_days: i64,
    pub cdn_storage_url: Option<String>,
    pub cdn_api_key: Option<String>,
    pub cdn_public_url: Option<String>,
    #[serde(default = "default_cache_capacity")]
    pub content_cache_capacity: u64,
    /// How long a user's active flag and role are trusted before re-reading.
    #[serde(default = "default_account_cache_seconds")]
    pub account_cache_seconds: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_refresh_token_days() -> i64 {
    30
}

fn default_subscription_days() -> i64 {
    30
}

fn default_cache_capacity() -> u64 {
    1000
}

fn default_account_cache_seconds() -> u64 {
    30
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/keci"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_minutes, 60);
        assert_eq!(config.refresh_token_days, 30);
        assert_eq!(config.default_subscription_days, 30);
        assert_eq!(config.account_cache_seconds, 30);
        assert!(config.cdn_storage_url.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/keci"),
            ("JWT_SECRET", "secret"),
            ("PORT", "9000"),
            ("CDN_STORAGE_URL", "https://storage.example.com/zone"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(
            config.cdn_storage_url.as_deref(),
            Some("https://storage.example.com/zone")
        );
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let result: Result<Config, _> =
            envy::from_iter(vars(&[("DATABASE_URL", "postgres://localhost/keci")]));
        assert!(result.is_err());
    }
}
