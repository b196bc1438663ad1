//! Check-config command - loads configuration the way `serve` does and
//! prints it with the secret redacted

use crate::config::{AppConfig, StartupEnv, DEBUG_ENV_VAR, SECRET_KEY_ENV_VAR};

use super::serve::build_socket_addr;

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let env = StartupEnv::from_env()?;
    build_socket_addr(&config)?;

    print!("{}", summarize(&config, &env));
    Ok(())
}

pub(crate) fn summarize(config: &AppConfig, env: &StartupEnv) -> String {
    let csrf = if config.csrf.enabled { "enabled" } else { "disabled" };

    format!(
        "listen:      {host}:{port}\n\
         logging:     {level} ({format:?})\n\
         csrf:        {csrf} (time limit {limit}s)\n\
         {secret_var:<12} set ({secret_len} bytes, redacted)\n\
         {debug_var:<12} {debug}\n",
        host = config.server.host,
        port = config.server.port,
        level = config.logging.level,
        format = config.logging.format,
        limit = config.csrf.time_limit_secs,
        secret_var = format!("{SECRET_KEY_ENV_VAR}:"),
        secret_len = env.secret_bytes().len(),
        debug_var = format!("{DEBUG_ENV_VAR}:"),
        debug = env.debug,
    )
}
