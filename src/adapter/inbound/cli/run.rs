//! Handler for the `run` command.

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::App;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args, output::is_json());

    if !config.logging.is_json() && !output::is_quiet() {
        print_startup(&config);
    }

    config.init_logging();
    App::run(config).await
}

fn apply_overrides(config: &mut Config, args: &RunArgs, force_json_logs: bool) {
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs || force_json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(path) = &args.database {
        config.database = path.to_string_lossy().to_string();
    }
    if args.no_live {
        config.monitor.live_enabled = false;
    }
}

fn print_startup(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Provider", config.llm.provider.as_str());
    output::field("Model", config.llm.model());
    output::field("Database", &config.database);
    output::field("Workers", config.settlement.workers);
    if output::verbosity() > 0 {
        output::field("Authority", &config.ledger.authority);
        output::field("Page size", config.monitor.page_size);
    }
    if config.monitor.live_enabled {
        output::field(
            "Live",
            format!("every {}s", config.monitor.live_interval_secs),
        );
    } else {
        output::field("Live", output::muted("disabled"));
    }
    output::note("Press Ctrl-C to stop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::adapter::inbound::cli::command::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["crowdsettle", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        let args = run_args(&["--log-level", "debug", "--database", "/tmp/x.db", "--no-live"]);

        apply_overrides(&mut config, &args, false);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database, "/tmp/x.db");
        assert!(!config.monitor.live_enabled);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn json_output_forces_json_logs() {
        let mut config = Config::default();
        apply_overrides(&mut config, &run_args(&[]), true);
        assert!(config.logging.is_json());
    }

    #[test]
    fn no_flags_keep_config() {
        let mut config = Config::default();
        let before = config.database.clone();
        apply_overrides(&mut config, &run_args(&[]), false);
        assert_eq!(config.database, before);
        assert!(config.monitor.live_enabled);
    }
}
