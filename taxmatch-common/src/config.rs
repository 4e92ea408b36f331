//! Configuration loading, file resolution and logging initialisation
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `TAXMATCH_CONFIG` environment variable
//! 3. `<user config dir>/taxmatch/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing or unreadable file is never fatal: the caller gets the compiled
//! defaults and a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "TAXMATCH_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub builder: BuilderConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Reference index locations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// JSON corpus of taxon records
    #[serde(default)]
    pub corpus: Option<PathBuf>,

    /// Persisted parameter vectors, keyed by record id
    #[serde(default)]
    pub parameters: Option<PathBuf>,
}

/// Matcher thresholds and relaxation behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    /// Best posterior at or above which no relaxation is attempted
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Candidates below this posterior are discarded
    #[serde(default = "default_possible_threshold")]
    pub possible_threshold: f64,

    /// Candidates within this distance of the best posterior are "top" candidates
    #[serde(default = "default_tie_margin")]
    pub tie_margin: f64,

    /// Observable names dropped, in order, while relaxing a query
    #[serde(default = "default_relaxation_order")]
    pub relaxation_order: Vec<String>,

    /// Longest synonym chain followed before giving up
    #[serde(default = "default_max_synonym_depth")]
    pub max_synonym_depth: usize,

    /// Parent steps searched for a shared accepted ancestor
    #[serde(default = "default_ancestor_search_depth")]
    pub ancestor_search_depth: usize,

    /// Inference trace verbosity (trace, debug, info, summary); absent disables tracing
    #[serde(default)]
    pub trace_level: Option<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            possible_threshold: default_possible_threshold(),
            tie_margin: default_tie_margin(),
            relaxation_order: default_relaxation_order(),
            max_synonym_depth: default_max_synonym_depth(),
            ancestor_search_depth: default_ancestor_search_depth(),
            trace_level: None,
        }
    }
}

impl MatcherConfig {
    /// Check threshold ranges and their relative order
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v > 0.0 && v < 1.0;
        if !in_unit(self.acceptance_threshold) {
            return Err(Error::Config(format!(
                "acceptance_threshold must be in (0, 1), got {}",
                self.acceptance_threshold
            )));
        }
        if !in_unit(self.possible_threshold) {
            return Err(Error::Config(format!(
                "possible_threshold must be in (0, 1), got {}",
                self.possible_threshold
            )));
        }
        if self.possible_threshold > self.acceptance_threshold {
            return Err(Error::Config(format!(
                "possible_threshold ({}) exceeds acceptance_threshold ({})",
                self.possible_threshold, self.acceptance_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.tie_margin) {
            return Err(Error::Config(format!(
                "tie_margin must be in [0, 1), got {}",
                self.tie_margin
            )));
        }
        if self.max_synonym_depth == 0 {
            return Err(Error::Config("max_synonym_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Offline parameter builder settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuilderConfig {
    /// Probabilities are clamped into [floor, 1 - floor]
    #[serde(default = "default_epistemic_floor")]
    pub epistemic_floor: f64,

    /// Used when the corpus cannot support a parameter
    #[serde(default = "default_probability")]
    pub default_probability: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            epistemic_floor: default_epistemic_floor(),
            default_probability: default_probability(),
        }
    }
}

impl BuilderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.epistemic_floor > 0.0 && self.epistemic_floor < 0.5) {
            return Err(Error::Config(format!(
                "epistemic_floor must be in (0, 0.5), got {}",
                self.epistemic_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.default_probability) {
            return Err(Error::Config(format!(
                "default_probability must be in [0, 1], got {}",
                self.default_probability
            )));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_acceptance_threshold() -> f64 {
    0.8
}

fn default_possible_threshold() -> f64 {
    0.1
}

fn default_tie_margin() -> f64 {
    0.2
}

fn default_relaxation_order() -> Vec<String> {
    [
        "order",
        "family",
        "phylum",
        "class",
        "scientificNameAuthorship",
        "taxonRank",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_synonym_depth() -> usize {
    16
}

fn default_ancestor_search_depth() -> usize {
    1
}

fn default_epistemic_floor() -> f64 {
    1e-6
}

fn default_probability() -> f64 {
    0.5
}

/// Resolve the configuration file path following the priority order above
///
/// Returns `None` when no candidate path exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User configuration directory
    dirs::config_dir()
        .map(|d| d.join("taxmatch").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse and validate a TOML configuration file
pub fn load_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.matcher.validate()?;
    config.builder.validate()?;
    Ok(config)
}

/// Load configuration, degrading to compiled defaults when the file is missing
///
/// Invalid values in an existing file are still an error.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_config(&path)
        }
        Some(path) => {
            warn!(
                "Configuration file {} not found, using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No configuration file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write configuration as TOML
pub fn write_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level. Logs go to the configured file
/// when one is set, otherwise to stderr.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| Error::Config(format!("Logging initialisation failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = TomlConfig::default();
        assert!(config.matcher.validate().is_ok());
        assert!(config.builder.validate().is_ok());
        assert_eq!(config.matcher.relaxation_order[0], "order");
        assert_eq!(config.matcher.relaxation_order.len(), 6);
    }

    #[test]
    fn test_threshold_order_rejected() {
        let config = MatcherConfig {
            possible_threshold: 0.9,
            acceptance_threshold: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [matcher]
            acceptance_threshold = 0.9
            "#,
        )
        .unwrap();
        assert_eq!(config.matcher.acceptance_threshold, 0.9);
        assert_eq!(config.matcher.possible_threshold, 0.1);
        assert_eq!(config.builder.epistemic_floor, 1e-6);
        assert_eq!(config.logging.level, "info");
    }
}
