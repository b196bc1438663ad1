//! Process configuration
//!
//! Layered application settings (files + `APP__*` variables) and the two
//! startup values read straight from the environment: the secret key and the
//! debug flag.

mod app_config;
mod error;
pub mod startup;

pub use app_config::{AppConfig, CsrfConfig, LogFormat, LoggingConfig, ServerConfig};
pub use error::ConfigError;
pub use startup::{DebugMode, StartupEnv, DEBUG_ENV_VAR, SECRET_KEY_ENV_VAR};
