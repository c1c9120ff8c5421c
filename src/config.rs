//! Application-level configuration loading for the scoring engine knobs.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STAGE_SCORING_CONFIG_PATH";

const DEFAULT_RESET_CHUNK_SIZE: usize = 5;
const DEFAULT_ACTIVITY_LOG_CAPACITY: usize = 50;
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Number of teams written concurrently by one reset chunk.
    pub reset_chunk_size: usize,
    /// Number of entries kept in the recent-activity feed.
    pub activity_log_capacity: usize,
    /// Capacity of the SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        reset_chunk_size = app_config.reset_chunk_size,
                        activity_log_capacity = app_config.activity_log_capacity,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reset_chunk_size: DEFAULT_RESET_CHUNK_SIZE,
            activity_log_capacity: DEFAULT_ACTIVITY_LOG_CAPACITY,
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file; missing keys keep their default.
struct RawConfig {
    reset_chunk_size: Option<usize>,
    activity_log_capacity: Option<usize>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let positive = |value: Option<usize>, default: usize| {
            value.filter(|value| *value > 0).unwrap_or(default)
        };

        Self {
            reset_chunk_size: positive(value.reset_chunk_size, defaults.reset_chunk_size),
            activity_log_capacity: positive(
                value.activity_log_capacity,
                defaults.activity_log_capacity,
            ),
            sse_capacity: positive(value.sse_capacity, defaults.sse_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/stage-scoring/app.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.reset_chunk_size, 5);
        assert_eq!(config.activity_log_capacity, 50);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "reset_chunk_size": 8 }"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.reset_chunk_size, 8);
        assert_eq!(config.sse_capacity, 32);
    }

    #[test]
    fn zero_values_are_ignored() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "reset_chunk_size": 0, "sse_capacity": 0 }"#).unwrap();
        assert_eq!(AppConfig::from(raw), AppConfig::default());
    }
}
