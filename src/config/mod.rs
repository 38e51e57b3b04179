//! Application configuration loaded from config files and `APP__`-prefixed
//! environment variables.

pub mod app_config;

pub use app_config::{
    AppConfig, ArtifactConfig, LogFormat, LoggingConfig, ServerConfig, TestRunLimitsConfig,
};
