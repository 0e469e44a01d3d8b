use secrecy::Secret;
use serde::Deserialize;

use crate::services::encryption::{EncryptionError, PanCodec};

const DEFAULT_MAX_CONNECTIONS: u32 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,

    // Root of all PAN key material
    pub encryption_secret: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Self::from_source(&config)
    }

    fn from_source(config: &config::Config) -> Result<Self, config::ConfigError> {
        Ok(Self {
            database_url: config.get("database_url")?,
            database_max_connections: config
                .get("database_max_connections")
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            encryption_secret: Secret::new(config.get("encryption_secret")?),
        })
    }

    /// Builds the PAN codec from the configured secret.
    pub fn pan_codec(&self) -> Result<PanCodec, EncryptionError> {
        PanCodec::new(&self.encryption_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn source(pairs: &[(&str, &str)]) -> config::Config {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_from_source_with_defaults() {
        let config = Config::from_source(&source(&[
            ("database_url", "postgres://localhost/cards"),
            ("encryption_secret", "a-very-long-secret-value-for-tests-0001"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/cards");
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(
            config.encryption_secret.expose_secret(),
            "a-very-long-secret-value-for-tests-0001"
        );
        assert!(config.pan_codec().is_ok());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let result = Config::from_source(&source(&[("database_url", "postgres://localhost/cards")]));

        assert!(result.is_err());
    }

    #[test]
    fn test_short_secret_fails_codec_construction() {
        let config = Config::from_source(&source(&[
            ("database_url", "postgres://localhost/cards"),
            ("encryption_secret", "short"),
        ]))
        .unwrap();

        assert!(matches!(config.pan_codec(), Err(EncryptionError::WeakSecret)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_source(&source(&[
            ("database_url", "postgres://localhost/cards"),
            ("encryption_secret", "a-very-long-secret-value-for-tests-0001"),
        ]))
        .unwrap();

        assert!(!format!("{:?}", config).contains("a-very-long-secret"));
    }
}
