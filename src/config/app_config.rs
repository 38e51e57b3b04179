use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub test_run: TestRunLimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where run artifacts are written
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    pub root: String,
}

/// Hard caps applied in test-run mode
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TestRunLimitsConfig {
    /// Generated-token cap per step
    pub max_tokens_per_step: u32,

    /// Wall-clock budget for the whole run, checked between steps
    pub max_runtime_secs: u64,

    /// Maximum number of steps executed
    pub max_steps: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            root: "./data/artifacts".to_string(),
        }
    }
}

impl Default for TestRunLimitsConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_step: 1000,
            max_runtime_secs: 60,
            max_steps: 5,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_caps() {
        let config = AppConfig::default();
        assert_eq!(config.test_run.max_tokens_per_step, 1000);
        assert_eq!(config.test_run.max_runtime_secs, 60);
        assert_eq!(config.test_run.max_steps, 5);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AppConfig = serde_json::from_str(r#"{"server": {"host": "127.0.0.1", "port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.test_run.max_steps, 5);
    }
}
