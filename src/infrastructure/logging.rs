use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{AppConfig, DebugMode, LogFormat};

pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub debug: DebugMode,
}

impl LoggingConfig {
    pub fn from_app_config(config: &AppConfig, debug: DebugMode) -> Self {
        Self {
            level: config.logging.level.clone(),
            format: config.logging.format.clone(),
            debug,
        }
    }

    /// Filter directive in effect when `RUST_LOG` is not set
    pub fn effective_level(&self) -> &str {
        if self.debug.is_enabled() {
            "debug"
        } else {
            &self.level
        }
    }
}

pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }

    tracing::info!("Logging initialized with level: {}", config.effective_level());

    if config.debug.is_enabled() {
        tracing::warn!("Debug mode is enabled; never run with it in production");
    }
}
