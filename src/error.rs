use thiserror::Error;

use crate::services::encryption::EncryptionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required input: {0}")]
    InvalidInput(&'static str),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// True when the caller sent a bad request rather than the system failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::InvalidInput(_))
    }

    /// Message that is safe to hand back to a caller.
    ///
    /// Internal failures collapse to a generic message so that no plaintext,
    /// key material or driver detail leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidInput(field) => format!("Missing required input: {}", field),
            AppError::Decoding(_)
            | AppError::Crypto(_)
            | AppError::Configuration(_)
            | AppError::Database(_)
            | AppError::Config(_) => "Internal server error".to_string(),
        }
    }
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        match err {
            EncryptionError::InvalidInput(field) => AppError::InvalidInput(field),
            EncryptionError::Decoding(msg) => AppError::Decoding(msg.to_string()),
            EncryptionError::EncryptionFailed(msg) => AppError::Crypto(msg),
            EncryptionError::WeakSecret => {
                AppError::Configuration("Encryption secret is too short".to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(AppError::Validation("Invalid PAN".to_string()).is_client_error());
        assert!(AppError::InvalidInput("pan").is_client_error());
        assert!(!AppError::Decoding("bad".to_string()).is_client_error());
        assert!(!AppError::Database(sqlx::Error::PoolTimedOut).is_client_error());
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = AppError::Database(sqlx::Error::Protocol("relation cards at 10.0.0.5".into()));
        assert_eq!(err.public_message(), "Internal server error");

        let err: AppError = EncryptionError::Decoding("authentication failed").into();
        assert!(matches!(err, AppError::Decoding(_)));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_public_message_keeps_validation_text() {
        let err = AppError::Validation("Invalid PAN".to_string());

        assert_eq!(err.public_message(), "Invalid PAN");
    }

    #[test]
    fn test_encryption_error_mapping() {
        assert!(matches!(
            AppError::from(EncryptionError::InvalidInput("plaintext")),
            AppError::InvalidInput("plaintext")
        ));
        assert!(matches!(
            AppError::from(EncryptionError::WeakSecret),
            AppError::Configuration(_)
        ));
        assert!(matches!(
            AppError::from(EncryptionError::EncryptionFailed("x".to_string())),
            AppError::Crypto(_)
        ));
    }
}
