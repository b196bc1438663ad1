//! Serve command - runs the form server

use std::net::{IpAddr, SocketAddr};

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::{AppConfig, ConfigError, StartupEnv};
use crate::infrastructure::logging::{self, LoggingConfig};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address, overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overrides server.port
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the server until Ctrl+C or SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (mut config, load_error) = config_or_default(AppConfig::load());
    args.apply(&mut config);

    let env = StartupEnv::from_env()?;
    logging::init_logging(&LoggingConfig::from_app_config(&config, env.debug));

    if let Some(e) = load_error {
        warn!("Failed to load configuration, using defaults: {}", e);
    }

    let state = AppState::new(&config, &env)?;
    let app = create_router(state);

    let addr = build_socket_addr(&config)?;
    info!(debug = %env.debug, "Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Fall back to defaults, keeping the load error so it can be logged once
/// logging is up
fn config_or_default(
    loaded: Result<AppConfig, config::ConfigError>,
) -> (AppConfig, Option<config::ConfigError>) {
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}

impl ServeArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

pub(crate) fn build_socket_addr(config: &AppConfig) -> Result<SocketAddr, ConfigError> {
    let ip = config
        .server
        .host
        .parse::<IpAddr>()
        .map_err(|e| ConfigError::invalid_address(&config.server.host, e.to_string()))?;

    Ok(SocketAddr::from((ip, config.server.port)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let mut config = AppConfig::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(3000),
        };
        args.apply(&mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_empty_args_keep_config() {
        let mut config = AppConfig::default();
        ServeArgs::default().apply(&mut config);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_load_error_is_kept() {
        let (config, error) =
            config_or_default(Err(config::ConfigError::Message("bad port".to_string())));

        assert_eq!(config.server.port, 8080);
        assert!(error.unwrap().to_string().contains("bad port"));
    }

    #[test]
    fn test_loaded_config_is_used() {
        let mut loaded = AppConfig::default();
        loaded.server.port = 9000;

        let (config, error) = config_or_default(Ok(loaded));
        assert_eq!(config.server.port, 9000);
        assert!(error.is_none());
    }

    #[test]
    fn test_build_socket_addr() {
        let addr = build_socket_addr(&AppConfig::default()).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_host_is_config_error() {
        let mut config = AppConfig::default();
        config.server.host = "not-an-ip".to_string();

        let result = build_socket_addr(&config);
        assert!(matches!(result, Err(ConfigError::InvalidAddress { .. })));
    }
}
