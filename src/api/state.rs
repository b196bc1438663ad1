//! Application state shared by handlers

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ConfigError, DebugMode, StartupEnv};
use crate::infrastructure::csrf::CsrfSigner;

/// Immutable per-process state, cloned into every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// `None` when CSRF protection is switched off in configuration
    pub csrf: Option<Arc<CsrfSigner>>,
    pub debug: DebugMode,
}

impl AppState {
    pub fn new(config: &AppConfig, env: &StartupEnv) -> Result<Self, ConfigError> {
        let csrf = if config.csrf.enabled {
            let time_limit = Duration::from_secs(config.csrf.time_limit_secs);
            Some(Arc::new(CsrfSigner::from_startup(env, time_limit)?))
        } else {
            None
        };

        Ok(Self {
            csrf,
            debug: env.debug,
        })
    }
}
