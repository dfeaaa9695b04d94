//! Configuration for input datasets and analysis thresholds
//!
//! Loads configuration from ab_decision.yml file

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default constants (fallback if ab_decision.yml not found and no env override)
pub const CONFIG_FILE: &str = "ab_decision.yml";
pub const DEFAULT_HYPOTHESES_PATH: &str = "files/datasets/hypotheses_us.csv";
pub const DEFAULT_ORDERS_PATH: &str = "files/datasets/orders_us.csv";
pub const DEFAULT_VISITS_PATH: &str = "files/datasets/visits_us.csv";
pub const DEFAULT_HYPOTHESES_DELIMITER: u8 = b';';
pub const DEFAULT_PERCENTILE: f64 = 95.0;
pub const DEFAULT_ALPHA: f64 = 0.05;

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    data: Option<DataSection>,
    cleanup: Option<CleanupSection>,
    outliers: Option<OutliersSection>,
    significance: Option<SignificanceSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DataSection {
    hypotheses: Option<String>,
    hypotheses_delimiter: Option<String>,
    orders: Option<String>,
    visits: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CleanupSection {
    drop_cross_group_visitors: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct OutliersSection {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    percentile: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    max_orders: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    max_revenue: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SignificanceSection {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    alpha: Option<String>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Locations of the three input tables.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub hypotheses: PathBuf,
    pub hypotheses_delimiter: u8,
    pub orders: PathBuf,
    pub visits: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            hypotheses: PathBuf::from(DEFAULT_HYPOTHESES_PATH),
            hypotheses_delimiter: DEFAULT_HYPOTHESES_DELIMITER,
            orders: PathBuf::from(DEFAULT_ORDERS_PATH),
            visits: PathBuf::from(DEFAULT_VISITS_PATH),
        }
    }
}

/// How anomalous visitors are detected.
///
/// A fixed `max_orders` / `max_revenue` wins over the percentile-derived value.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierConfig {
    pub percentile: f64,
    pub max_orders: Option<f64>,
    pub max_revenue: Option<f64>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_PERCENTILE,
            max_orders: None,
            max_revenue: None,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub drop_cross_group_visitors: bool,
    pub outliers: OutlierConfig,
    pub alpha: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration from ab_decision.yml in the current or parent directory.
    ///
    /// Without a file the built-in defaults are used, still overridden by the
    /// `AB_*` environment variables. A file that exists but cannot be read or
    /// parsed is an error.
    pub fn new() -> Result<Self> {
        Self::load_first(&[PathBuf::from(CONFIG_FILE), Path::new("..").join(CONFIG_FILE)])
    }

    /// Load from an explicit path, or fall back to [`Config::new`] when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::new(),
        }
    }

    /// Load the first candidate that exists; only a missing file moves on to the next.
    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        Self::load_dotenv();

        for path in candidates {
            if let Some(yaml) = Self::read_yaml(path)? {
                return Self::from_yaml(yaml);
            }
        }

        Self::from_yaml(YamlConfig::default())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value
    }

    /// Resolve a float from string config or env var.
    ///
    /// Plain numbers in the YAML win over the env key; `${VAR}` placeholders do not.
    fn resolve_env_f64(value: Option<String>, env_key: &str) -> Result<Option<f64>> {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
                return match std::env::var(var_name).or_else(|_| std::env::var(env_key)) {
                    Ok(env_val) => Self::parse_f64(&env_val, env_key).map(Some),
                    Err(_) => Ok(None),
                };
            }
            return Self::parse_f64(v, env_key).map(Some);
        }
        match std::env::var(env_key) {
            Ok(env_val) => Self::parse_f64(&env_val, env_key).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn parse_f64(raw: &str, name: &str) -> Result<f64> {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| Error::ConfigError(format!("{}: '{}' is not a number ({})", name, raw, e)))
    }

    fn parse_delimiter(raw: &str) -> Result<u8> {
        match raw.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(Error::ConfigError(format!(
                "hypotheses_delimiter must be a single ASCII character, got '{}'",
                raw
            ))),
        }
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let path = path.as_ref();
        let yaml = Self::read_yaml(path)?.ok_or_else(|| {
            Error::ConfigError(format!("Config file {} not found", path.display()))
        })?;
        Self::from_yaml(yaml)
    }

    /// Parse a config file; `Ok(None)` when it does not exist.
    fn read_yaml(path: &Path) -> Result<Option<YamlConfig>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::ConfigError(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_yaml::from_str(&content).map(Some).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Build and validate a config, applying env overrides to every section.
    fn from_yaml(yaml: YamlConfig) -> Result<Self> {
        let data = yaml.data.unwrap_or_default();
        let outliers = yaml.outliers.unwrap_or_default();
        let significance = yaml.significance.unwrap_or_default();

        let hypotheses_delimiter = match data.hypotheses_delimiter {
            Some(raw) => Self::parse_delimiter(&raw)?,
            None => DEFAULT_HYPOTHESES_DELIMITER,
        };

        let config = Self {
            data: DataConfig {
                hypotheses: Self::resolve_env_string(data.hypotheses, "AB_HYPOTHESES_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_HYPOTHESES_PATH)),
                hypotheses_delimiter,
                orders: Self::resolve_env_string(data.orders, "AB_ORDERS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_ORDERS_PATH)),
                visits: Self::resolve_env_string(data.visits, "AB_VISITS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_VISITS_PATH)),
            },
            drop_cross_group_visitors: yaml
                .cleanup
                .and_then(|c| c.drop_cross_group_visitors)
                .unwrap_or(true),
            outliers: OutlierConfig {
                percentile: Self::resolve_env_f64(outliers.percentile, "AB_OUTLIER_PERCENTILE")?
                    .unwrap_or(DEFAULT_PERCENTILE),
                max_orders: Self::resolve_env_f64(outliers.max_orders, "AB_MAX_ORDERS")?,
                max_revenue: Self::resolve_env_f64(outliers.max_revenue, "AB_MAX_REVENUE")?,
            },
            alpha: Self::resolve_env_f64(significance.alpha, "AB_ALPHA")?.unwrap_or(DEFAULT_ALPHA),
        };

        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults, ignoring files and environment
    pub fn defaults() -> Self {
        Self {
            data: DataConfig::default(),
            drop_cross_group_visitors: true,
            outliers: OutlierConfig::default(),
            alpha: DEFAULT_ALPHA,
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.outliers.percentile > 0.0 && self.outliers.percentile <= 100.0) {
            return Err(Error::ConfigError(format!(
                "outlier percentile must be in (0, 100], got {}",
                self.outliers.percentile
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::ConfigError(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        for (name, value) in [
            ("max_orders", self.outliers.max_orders),
            ("max_revenue", self.outliers.max_revenue),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(Error::ConfigError(format!(
                        "{} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }
}
