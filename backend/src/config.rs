use serde::Deserialize;
use shared::DetectorKind;
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TAMPERED_URL: &str =
    "https://hifi-app-47f8c5.ambitioussand-4fd0f12d.eastus.azurecontainerapps.io/detect";
pub const DEFAULT_GENERATED_URL: &str =
    "https://ai-detector-api.politeflower-7bb2893a.eastus.azurecontainerapps.io/predict";
const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid {kind} detector URL {url}: {reason}")]
    InvalidUrl {
        kind: DetectorKind,
        url: String,
        reason: String,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// A detector service and where to reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorEndpoint {
    pub kind: DetectorKind,
    pub url: Url,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    pub tampered_url: String,
    pub generated_url: String,
    pub timeout_secs: u64,
}

impl Default for DetectorsConfig {
    fn default() -> Self {
        Self {
            tampered_url: DEFAULT_TAMPERED_URL.to_string(),
            generated_url: DEFAULT_GENERATED_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub frontend_dir: String,
    pub max_upload_bytes: usize,
    /// Server sessions idle longer than this are evicted.
    pub session_ttl_secs: u64,
    pub detectors: DetectorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            frontend_dir: default_frontend_dir(),
            max_upload_bytes: 50 * 1024 * 1024,
            session_ttl_secs: 3600,
            detectors: DetectorsConfig::default(),
        }
    }
}

fn default_frontend_dir() -> String {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        format!("{}/../frontend/dist", manifest_dir)
    } else {
        "/usr/src/app/frontend/dist".to_string()
    }
}

impl AppConfig {
    /// Reads the optional YAML file, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("APP_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = parse_value("PORT", &port)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend_dir = dir;
        }
        if let Some(max) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_value("MAX_UPLOAD_BYTES", &max)?;
        }
        if let Some(ttl) = lookup("SESSION_TTL_SECS") {
            self.session_ttl_secs = parse_value("SESSION_TTL_SECS", &ttl)?;
        }
        if let Some(url) = lookup("TAMPERED_DETECTOR_URL") {
            self.detectors.tampered_url = url;
        }
        if let Some(url) = lookup("GENERATED_DETECTOR_URL") {
            self.detectors.generated_url = url;
        }
        if let Some(secs) = lookup("DETECTOR_TIMEOUT_SECS") {
            self.detectors.timeout_secs = parse_value("DETECTOR_TIMEOUT_SECS", &secs)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detectors.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                value: "0".into(),
            });
        }
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session_ttl_secs",
                value: "0".into(),
            });
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_upload_bytes",
                value: "0".into(),
            });
        }
        self.endpoints().map(|_| ())
    }

    pub fn endpoint(&self, kind: DetectorKind) -> Result<DetectorEndpoint, ConfigError> {
        let raw = match kind {
            DetectorKind::Tampered => &self.detectors.tampered_url,
            DetectorKind::Generated => &self.detectors.generated_url,
        };
        let invalid = |reason: String| ConfigError::InvalidUrl {
            kind,
            url: raw.clone(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(DetectorEndpoint { kind, url }),
            other => Err(invalid(format!("unsupported scheme {}", other))),
        }
    }

    pub fn endpoints(&self) -> Result<Vec<DetectorEndpoint>, ConfigError> {
        [DetectorKind::Tampered, DetectorKind::Generated]
            .into_iter()
            .map(|kind| self.endpoint(kind))
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.detectors.timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
