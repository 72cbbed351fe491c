//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; secrets such as LLM API keys
//! come from the environment (a `.env` file is honored by the binary).
//!
//! # Example
//!
//! ```no_run
//! use crowdsettle::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::ledger::LedgerConfig;
use super::llm::LlmConfig;
use super::logging::LoggingConfig;
use super::monitor::MonitorConfig;
use super::rating::RatingConfig;
use super::settlement::SettlementConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider behind the opinion rater.
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rating: RatingConfig,

    /// Worker pool and retry policy.
    #[serde(default)]
    pub settlement: SettlementConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Path to the SQLite database file.
    ///
    /// Defaults to "crowdsettle.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,
}

fn default_database_path() -> String {
    "crowdsettle.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
            rating: RatingConfig::default(),
            settlement: SettlementConfig::default(),
            monitor: MonitorConfig::default(),
            ledger: LedgerConfig::default(),
            database: default_database_path(),
        }
    }
}

fn positive(field: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than 0".to_string(),
        }
        .into());
    }
    Ok(())
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Check that all values are within acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::InvalidValue`]
    /// naming the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: "must be \"pretty\" or \"json\"".to_string(),
            }
            .into());
        }

        let llm_model = self.llm.model();
        if llm_model.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "model" }.into());
        }
        for temperature in [self.llm.anthropic.temperature, self.llm.openai.temperature] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    field: "temperature",
                    reason: "must be between 0 and 2".to_string(),
                }
                .into());
            }
        }

        positive("timeout_secs", self.rating.timeout_secs)?;
        positive("max_text_chars", self.rating.max_text_chars as u64)?;
        positive("batch_size", self.rating.batch_size as u64)?;

        let settlement = &self.settlement;
        positive("workers", settlement.workers as u64)?;
        positive("max_attempts", u64::from(settlement.max_attempts))?;
        positive("initial_backoff_ms", settlement.initial_backoff_ms)?;
        positive("poll_interval_ms", settlement.poll_interval_ms)?;
        positive("job_timeout_secs", settlement.job_timeout_secs)?;
        if settlement.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            }
            .into());
        }
        if settlement.max_backoff_ms < settlement.initial_backoff_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_backoff_ms",
                reason: "must be >= initial_backoff_ms".to_string(),
            }
            .into());
        }
        if settlement.job_timeout_secs <= self.rating.timeout_secs {
            return Err(ConfigError::InvalidValue {
                field: "job_timeout_secs",
                reason: "must exceed rating.timeout_secs".to_string(),
            }
            .into());
        }

        let monitor = &self.monitor;
        positive("settlement_interval_secs", monitor.settlement_interval_secs)?;
        positive("live_interval_secs", monitor.live_interval_secs)?;
        positive("page_size", monitor.page_size as u64)?;
        if monitor.live_min_opinions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live_min_opinions",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if self.ledger.authority.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "authority" }.into());
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infrastructure::config::llm::LlmProvider;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.settlement.workers, 5);
        assert_eq!(config.settlement.max_attempts, 3);
        assert_eq!(config.settlement.initial_backoff_ms, 2_000);
        assert_eq!(config.monitor.settlement_interval_secs, 60);
        assert_eq!(config.monitor.live_interval_secs, 120);
        assert_eq!(config.monitor.live_debounce_secs, 90);
        assert_eq!(config.monitor.live_min_opinions, 2);
        assert_eq!(config.rating.timeout_secs, 30);
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.database, "crowdsettle.db");
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
database = "/tmp/settle.db"

[llm]
provider = "openai"

[llm.openai]
model = "gpt-4o"

[settlement]
workers = 2
max_backoff_ms = 10000

[monitor]
live_enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.model(), "gpt-4o");
        assert_eq!(config.llm.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(config.settlement.workers, 2);
        assert_eq!(config.settlement.max_attempts, 3);
        assert!(!config.monitor.live_enabled);
        assert_eq!(config.database, "/tmp/settle.db");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result = Config::parse_toml("[settlement]\nworkers = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "workers",
                ..
            }))
        ));
    }

    #[test]
    fn backoff_ceiling_below_floor_is_rejected() {
        let result = Config::parse_toml(
            "[settlement]\ninitial_backoff_ms = 5000\nmax_backoff_ms = 1000\n",
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "max_backoff_ms",
                ..
            }))
        ));
    }

    #[test]
    fn job_timeout_must_cover_rating_timeout() {
        let result = Config::parse_toml(
            "[rating]\ntimeout_secs = 60\n[settlement]\njob_timeout_secs = 30\n",
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "job_timeout_secs",
                ..
            }))
        ));
    }

    #[test]
    fn blank_authority_is_missing() {
        let result = Config::parse_toml("[ledger]\nauthority = \"  \"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "authority" }))
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = Config::parse_toml("[logging]\nformat = \"xml\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "format", .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[settlement\nworkers = 1");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
