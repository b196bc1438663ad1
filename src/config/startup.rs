//! Values read from the process environment once at startup

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use super::ConfigError;

/// Variable holding the server-side signing secret. Required, no default.
pub const SECRET_KEY_ENV_VAR: &str = "SECRET_KEY";

/// Variable enabling debug mode. Only the literal `1` turns it on.
pub const DEBUG_ENV_VAR: &str = "APP_DEBUG";

/// Verbose diagnostic mode. Must never be enabled in production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugMode(bool);

impl DebugMode {
    pub const fn enabled() -> Self {
        Self(true)
    }

    pub const fn disabled() -> Self {
        Self(false)
    }

    /// Interpret the raw flag value; anything other than exactly `"1"` is off
    pub fn from_env_value(value: Option<&str>) -> Self {
        Self(value == Some("1"))
    }

    pub fn is_enabled(self) -> bool {
        self.0
    }
}

impl fmt::Display for DebugMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 {
            write!(f, "enabled")
        } else {
            write!(f, "disabled")
        }
    }
}

/// Secret key and debug flag as read at process start
#[derive(Debug)]
pub struct StartupEnv {
    pub secret_key: SecretString,
    pub debug: DebugMode,
}

impl StartupEnv {
    pub fn new(secret_key: impl Into<String>, debug: DebugMode) -> Self {
        Self {
            secret_key: SecretString::from(secret_key.into()),
            debug,
        }
    }

    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup(SECRET_KEY_ENV_VAR)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingSecretKey)?;

        let debug = DebugMode::from_env_value(lookup(DEBUG_ENV_VAR).as_deref());

        Ok(Self::new(secret_key, debug))
    }

    pub fn secret_bytes(&self) -> &[u8] {
        self.secret_key.expose_secret().as_bytes()
    }
}
