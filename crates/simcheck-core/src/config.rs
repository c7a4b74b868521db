//! Engine configuration: tolerances, years of interest, execution mapping.
//!
//! Loaded once from TOML and passed by value (or `Arc`) into the engine.
//!
//! ```toml
//! trend_permissible_error = 5
//! relative_error = 10
//! years_of_interest = [2025, 2026, 2027]
//!
//! [executions]
//! quality = "5e76df9b-836a-4a4d-bd11-1ff544ae30e7"
//! quantity = "5e76df9b-836a-4a4d-bd11-1ff544ae30e7"
//!
//! [paths]
//! experiments_dir = "experiments"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::is_identifier;

/// Default flat-trend tolerance, in percent.
pub const DEFAULT_TREND_PERMISSIBLE_ERROR: f64 = 5.0;

/// Default limit on the mean relative error, in percent.
pub const DEFAULT_RELATIVE_ERROR: f64 = 10.0;

/// Configuration errors. All of them are fatal before any case runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no execution id configured for {0} tests")]
    MissingExecution(TestKind),

    #[error("invalid execution id '{id}' for {kind} tests")]
    InvalidExecution { kind: TestKind, id: String },

    #[error("{name} must be a finite, non-negative percentage (got {value})")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("years_of_interest must not be empty")]
    NoYearsOfInterest,
}

/// Logical test family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Quality,
    Quantity,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::Quality => "quality",
            TestKind::Quantity => "quantity",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Filesystem locations used by the file-backed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `results_<execution>_<experiment>.csv` files.
    pub experiments_dir: PathBuf,
    /// Directory holding `qualitative.csv` and `quantitative.csv`.
    pub resources_dir: PathBuf,
    /// Where reports are written.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            experiments_dir: PathBuf::from("experiments"),
            resources_dir: PathBuf::from("resources"),
            output_dir: PathBuf::from("resources"),
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max percentage difference for a year expected to stay flat.
    pub trend_permissible_error: f64,
    /// Max absolute mean relative error for a quantitative case to pass.
    pub relative_error: f64,
    /// Years compared by quantitative cases, in evaluation order.
    pub years_of_interest: Vec<i32>,
    /// Test family name (`quality` / `quantity`) to execution id.
    pub executions: BTreeMap<String, String>,
    pub paths: PathsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trend_permissible_error: DEFAULT_TREND_PERMISSIBLE_ERROR,
            relative_error: DEFAULT_RELATIVE_ERROR,
            years_of_interest: (2025..=2035).collect(),
            executions: BTreeMap::new(),
            paths: PathsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tolerance("trend_permissible_error", self.trend_permissible_error)?;
        check_tolerance("relative_error", self.relative_error)?;
        if self.years_of_interest.is_empty() {
            return Err(ConfigError::NoYearsOfInterest);
        }
        Ok(())
    }

    /// Execution id configured for a test family.
    pub fn execution_for(&self, kind: TestKind) -> Result<&str, ConfigError> {
        let id = self
            .executions
            .get(kind.name())
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingExecution(kind))?;

        if !is_identifier(id) {
            return Err(ConfigError::InvalidExecution {
                kind,
                id: id.to_string(),
            });
        }
        Ok(id)
    }

    pub fn with_execution(mut self, kind: TestKind, execution_id: impl Into<String>) -> Self {
        self.executions
            .insert(kind.name().to_string(), execution_id.into());
        self
    }

    pub fn with_years_of_interest(mut self, years: Vec<i32>) -> Self {
        self.years_of_interest = years;
        self
    }

    pub fn with_tolerances(mut self, trend_permissible_error: f64, relative_error: f64) -> Self {
        self.trend_permissible_error = trend_permissible_error;
        self.relative_error = relative_error;
        self
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.trend_permissible_error, 5.0);
        assert_eq!(config.relative_error, 10.0);
        assert_eq!(config.years_of_interest.first(), Some(&2025));
        assert_eq!(config.years_of_interest.last(), Some(&2035));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = EngineConfig::from_toml_str(
            r#"
            trend_permissible_error = 2.5
            years_of_interest = [2030, 2031]

            [executions]
            quality = "exec-q"
            quantity = "exec-n"

            [paths]
            experiments_dir = "/data/experiments"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.trend_permissible_error, 2.5);
        assert_eq!(config.relative_error, DEFAULT_RELATIVE_ERROR);
        assert_eq!(config.years_of_interest, vec![2030, 2031]);
        assert_eq!(config.execution_for(TestKind::Quality).expect("quality"), "exec-q");
        assert_eq!(config.execution_for(TestKind::Quantity).expect("quantity"), "exec-n");
        assert_eq!(config.paths.experiments_dir, PathBuf::from("/data/experiments"));
        assert_eq!(config.paths.resources_dir, PathBuf::from("resources"));
    }

    #[test]
    fn test_missing_execution_is_config_error() {
        let config = EngineConfig::default().with_execution(TestKind::Quality, "abc");
        let err = config.execution_for(TestKind::Quantity).unwrap_err();
        assert!(matches!(err, ConfigError::MissingExecution(TestKind::Quantity)));
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn test_invalid_execution_id() {
        let config = EngineConfig::default().with_execution(TestKind::Quality, "a_b");
        assert!(matches!(
            config.execution_for(TestKind::Quality).unwrap_err(),
            ConfigError::InvalidExecution { .. }
        ));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = EngineConfig::from_toml_str("relative_error = -1").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTolerance {
                name: "relative_error",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_years_rejected() {
        let err = EngineConfig::from_toml_str("years_of_interest = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoYearsOfInterest));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("simcheck.toml");
        std::fs::write(&path, "[executions]\nquality = \"q1\"\n").expect("write");

        let config = EngineConfig::load(&path).expect("load");
        assert_eq!(config.execution_for(TestKind::Quality).expect("quality"), "q1");

        let missing = EngineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
