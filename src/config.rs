//! Application configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::ExporterError;
use crate::models::AllowList;
use crate::server::HEALTH_PATH;

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "ICEBREAKER";

/// Nordic state icebreakers tracked unless configured otherwise
pub const DEFAULT_VESSELS: &[&str] = &[
    "OTSO",
    "KONTIO",
    "POLARIS",
    "URHO",
    "SISU",
    "VOIMA",
    "FENNICA",
    "NORDICA",
    "ALE",
    "ATLE",
    "FREJ",
    "ODEN",
    "YMER",
    "IDUN",
    "KRONPRINS HAAKON",
    "SVALBARD",
];

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub digitraffic: DigitrafficConfig,
    pub vessels: VesselsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen_address: String,
    pub metrics_path: String,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DigitrafficConfig {
    pub vessels_url: String,
    pub locations_url: String,
    /// Sent in the `Digitraffic-User` header
    pub user: String,
    /// Budget for fetching both payloads of one refresh
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub refresh_interval: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VesselsConfig {
    pub names: Vec<String>,
}

impl AppConfig {
    /// Load from `config/default.*` and `ICEBREAKER__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            File::with_name(DEFAULT_CONFIG_FILE).required(false),
            Self::environment(ENV_PREFIX),
        )
    }

    fn environment(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("vessels.names")
    }

    fn load_from(
        file: File<FileSourceFile, FileFormat>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.listen_address", "0.0.0.0:9877")?
            .set_default("server.metrics_path", "/metrics")?
            .set_default(
                "digitraffic.vessels_url",
                "https://meri.digitraffic.fi/api/ais/v1/vessels",
            )?
            .set_default(
                "digitraffic.locations_url",
                "https://meri.digitraffic.fi/api/ais/v1/locations",
            )?
            .set_default("digitraffic.user", "icebreaker-exporter/1.0")?
            .set_default("digitraffic.request_timeout", 20_i64)?
            .set_default("digitraffic.refresh_interval", 120_i64)?
            .set_default("vessels.names", DEFAULT_VESSELS.to_vec())?
            .add_source(file)
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ExporterError> {
        self.server.validate()?;
        self.digitraffic.validate()?;
        if self.vessels.allow_list().is_empty() {
            return Err(ExporterError::ConfigurationError {
                message: "At least one vessel name must be configured".to_string(),
            });
        }
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ExporterError> {
        let path = self.metrics_path.as_str();
        if !path.starts_with('/') || path == "/" || path == HEALTH_PATH {
            return Err(ExporterError::ConfigurationError {
                message: format!(
                    "Metrics path must start with '/' and differ from '/' and '{}', got '{}'",
                    HEALTH_PATH, path
                ),
            });
        }
        // Segments axum would read as captures, wildcards or escapes
        if path
            .split('/')
            .skip(1)
            .any(|segment| {
                segment.is_empty()
                    || segment.starts_with([':', '*'])
                    || segment.contains(['{', '}'])
            })
        {
            return Err(ExporterError::ConfigurationError {
                message: format!("Metrics path must be a plain path, got '{}'", path),
            });
        }
        Ok(())
    }
}

impl DigitrafficConfig {
    fn validate(&self) -> Result<(), ExporterError> {
        if self.vessels_url.trim().is_empty() || self.locations_url.trim().is_empty() {
            return Err(ExporterError::ConfigurationError {
                message: "Digitraffic URLs cannot be empty".to_string(),
            });
        }
        if self.refresh_interval.is_zero() {
            return Err(ExporterError::ConfigurationError {
                message: "Refresh interval must be greater than zero".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ExporterError::ConfigurationError {
                message: "Request timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl VesselsConfig {
    /// Normalized set of tracked names
    pub fn allow_list(&self) -> AllowList {
        AllowList::from_names(&self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    fn missing_file() -> File<FileSourceFile, FileFormat> {
        File::with_name("config/does-not-exist").required(false)
    }

    #[test]
    fn test_load_defaults() {
        let config =
            AppConfig::load_from(missing_file(), AppConfig::environment("ICEBREAKER_T1")).unwrap();

        assert_eq!(config.server.listen_address, "0.0.0.0:9877");
        assert_eq!(config.server.metrics_path, "/metrics");
        assert_eq!(config.digitraffic.user, "icebreaker-exporter/1.0");
        assert_eq!(config.digitraffic.request_timeout, Duration::from_secs(20));
        assert_eq!(config.digitraffic.refresh_interval, Duration::from_secs(120));
        assert_eq!(config.vessels.names.len(), DEFAULT_VESSELS.len());
        assert!(config.vessels.allow_list().contains("Kronprins Haakon"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_from_env() {
        env::set_var("ICEBREAKER_T2__SERVER__LISTEN_ADDRESS", "127.0.0.1:9000");
        env::set_var("ICEBREAKER_T2__DIGITRAFFIC__REQUEST_TIMEOUT", "5");
        env::set_var("ICEBREAKER_T2__DIGITRAFFIC__REFRESH_INTERVAL", "30");
        env::set_var("ICEBREAKER_T2__VESSELS__NAMES", "Otso, kontio");

        let config =
            AppConfig::load_from(missing_file(), AppConfig::environment("ICEBREAKER_T2")).unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:9000");
        assert_eq!(config.digitraffic.request_timeout, Duration::from_secs(5));
        assert_eq!(config.digitraffic.refresh_interval, Duration::from_secs(30));
        assert_eq!(
            config.vessels.allow_list(),
            AllowList::from_names(["OTSO", "KONTIO"])
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exporter.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
metrics_path = "/icebreakers"

[digitraffic]
user = "test-suite/0.1"
refresh_interval = 60

[vessels]
names = ["Polaris", "Oden"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(
            File::from(path.as_path()),
            AppConfig::environment("ICEBREAKER_T3"),
        )
        .unwrap();
        assert_eq!(config.server.metrics_path, "/icebreakers");
        assert_eq!(config.server.listen_address, "0.0.0.0:9877");
        assert_eq!(config.digitraffic.user, "test-suite/0.1");
        assert_eq!(config.digitraffic.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.digitraffic.request_timeout, Duration::from_secs(20));
        assert_eq!(
            config.vessels.allow_list(),
            AllowList::from_names(["POLARIS", "ODEN"])
        );
    }

    fn valid_config() -> AppConfig {
        AppConfig::load_from(missing_file(), AppConfig::environment("ICEBREAKER_T4")).unwrap()
    }

    #[test]
    fn test_validate_zero_durations() {
        let mut config = valid_config();
        config.digitraffic.refresh_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.digitraffic.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_vessel_names() {
        let mut config = valid_config();
        config.vessels.names = vec![" ".to_string(), String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_metrics_path() {
        for path in [
            "metrics",
            "/",
            "/healthz",
            "/:metrics",
            "/api/*rest",
            "/{metrics}",
            "/icebreaker_{up}",
            "//metrics",
            "/metrics/",
        ] {
            let mut config = valid_config();
            config.server.metrics_path = path.to_string();
            assert!(config.validate().is_err(), "path {}", path);
        }

        for path in ["/metrics", "/icebreakers/metrics"] {
            let mut config = valid_config();
            config.server.metrics_path = path.to_string();
            assert!(config.validate().is_ok(), "path {}", path);
        }
    }
}
