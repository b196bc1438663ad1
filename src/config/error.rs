use thiserror::Error;

/// Errors raised while assembling the process configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY is not set; refusing to start without a secret key")]
    MissingSecretKey,

    #[error("Secret key cannot be used for signing: {message}")]
    InvalidSecretKey { message: String },

    #[error("Invalid listen address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid_secret_key(message: impl Into<String>) -> Self {
        Self::InvalidSecretKey {
            message: message.into(),
        }
    }

    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }
}
