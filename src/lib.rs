//! formguard
//!
//! A form handling web service that:
//! - reads its signing secret from the environment instead of source
//! - validates every submitted field against a declarative schema
//! - enables debug diagnostics only when `APP_DEBUG=1`

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{AppConfig, DebugMode, StartupEnv};
