//! TOML configuration: sensible defaults, environment variable override for
//! the config file path, and a standard filesystem location.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Root configuration for the scanwatch process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `SCANWATCH_CONFIG` environment variable.
    /// 2. `/etc/scanwatch/scanwatch.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("SCANWATCH_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "SCANWATCH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new("/etc/scanwatch/scanwatch.toml");
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

/// Where the anomaly-detection backend lives and how long a submission may
/// stay in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend service.
    pub base_url: String,
    /// Upper bound on a single `/analyze/` round-trip, in seconds. The
    /// busy flag is released when this elapses.
    pub submit_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            submit_timeout_secs: 10,
        }
    }
}

/// Cadence of the two refresh timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between log fetches.
    pub fetch_interval_secs: u64,
    /// Seconds between clock-only refreshes of relative-time labels.
    /// This timer never hits the network.
    pub clock_refresh_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: 5,
            clock_refresh_secs: 30,
        }
    }
}

/// Gateway HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port for the dashboard API listener.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = DashConfig::default();

        assert_eq!(cfg.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.backend.submit_timeout_secs, 10);
        assert_eq!(cfg.poll.fetch_interval_secs, 5);
        assert_eq!(cfg.poll.clock_refresh_secs, 30);
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_str = r#"
[backend]
base_url = "http://10.0.0.5:9000"
submit_timeout_secs = 3

[poll]
fetch_interval_secs = 2
clock_refresh_secs = 15

[server]
bind = "127.0.0.1:9090"

[logging]
level = "debug"
"#;

        let cfg: DashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.backend.base_url, "http://10.0.0.5:9000");
        assert_eq!(cfg.backend.submit_timeout_secs, 3);
        assert_eq!(cfg.poll.fetch_interval_secs, 2);
        assert_eq!(cfg.poll.clock_refresh_secs, 15);
        assert_eq!(cfg.server.bind, "127.0.0.1:9090");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[backend]
base_url = "http://192.168.1.20:8000"
"#;

        let cfg: DashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.backend.base_url, "http://192.168.1.20:8000");
        // Everything else should be defaults.
        assert_eq!(cfg.backend.submit_timeout_secs, 10);
        assert_eq!(cfg.poll.fetch_interval_secs, 5);
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: DashConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.backend.base_url, DashConfig::default().backend.base_url);
        assert_eq!(cfg.poll.fetch_interval_secs, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scanwatch.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9999"
"#,
        )
        .unwrap();

        let cfg = DashConfig::load(&path).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9999");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = DashConfig::load(Path::new("/nonexistent/path/scanwatch.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cfg = DashConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let roundtripped: DashConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(cfg.backend.base_url, roundtripped.backend.base_url);
        assert_eq!(cfg.poll.fetch_interval_secs, roundtripped.poll.fetch_interval_secs);
        assert_eq!(cfg.server.bind, roundtripped.server.bind);
    }
}
