use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// What `check config` found, beyond the file being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCheckReport {
    pub provider: String,
    pub model: String,
    pub api_key_var: &'static str,
    pub api_key_present: bool,
    pub workers: usize,
    pub max_attempts: u32,
    pub live_enabled: bool,
    pub database: String,
}

impl ConfigCheckReport {
    fn from_config(config: &Config, api_key_present: bool) -> Self {
        Self {
            provider: config.llm.provider.as_str().to_string(),
            model: config.llm.model().to_string(),
            api_key_var: config.llm.api_key_var(),
            api_key_present,
            workers: config.settlement.workers,
            max_attempts: config.settlement.max_attempts,
            live_enabled: config.monitor.live_enabled,
            database: config.database.clone(),
        }
    }
}

/// Validate configuration file without starting the service.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;
    let key_present = std::env::var(config.llm.api_key_var()).is_ok_and(|v| !v.trim().is_empty());
    let report = ConfigCheckReport::from_config(&config, key_present);

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Provider", &report.provider);
    output::field("Model", &report.model);
    output::field("Workers", report.workers);
    output::field("Attempts", report.max_attempts);
    output::field("Live", if report.live_enabled { "enabled" } else { "disabled" });
    output::field("Database", &report.database);

    if report.api_key_present {
        output::success("LLM API key detected");
    } else {
        output::warning(&format!(
            "{} is not set; ratings will fail until it is",
            report.api_key_var
        ));
    }

    output::success("Configuration check complete");
    Ok(())
}
