//! Command-line interface definitions.
//!
//! Defines the CLI structure for the crowdsettle service using `clap`.
//! Besides running the service, the CLI scores job snapshots offline and
//! gives operators a handle on the settlement queue.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::paths;

/// Settlement engine for crowd opinion markets
#[derive(Parser, Debug)]
#[command(name = "crowdsettle")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the crowdsettle CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run settlement workers and monitors until Ctrl-C
    Run(RunArgs),

    /// Score a job snapshot offline and print the settlement report
    Score(ScoreArgs),

    /// Inspect and manage settlement jobs
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `crowdsettle jobs`.
#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// List jobs parked after exhausting their retries.
    Failed(ConfigPathArg),
    /// Put a failed job back on the queue with a fresh attempt count.
    Retry(JobRetryArgs),
    /// Queue a closed market for settlement.
    Enqueue(JobEnqueueArgs),
}

/// Subcommands for `crowdsettle check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file syntax and semantics.
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config file path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for `crowdsettle run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the database path
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Disable the live sentiment monitor
    #[arg(long)]
    pub no_live: bool,
}

/// Arguments for `crowdsettle score`.
#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Job snapshot (JSON) to score
    pub file: PathBuf,

    /// AI score applied to every opinion and to the market rating
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub ai_score: u8,

    /// Seed for the jackpot draw
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `crowdsettle jobs retry`.
#[derive(Parser, Debug)]
pub struct JobRetryArgs {
    /// ID of the failed job
    pub id: String,

    /// Path to configuration file
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for `crowdsettle jobs enqueue`.
#[derive(Parser, Debug)]
pub struct JobEnqueueArgs {
    /// Market to settle
    pub market: String,

    /// Path to configuration file
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "crowdsettle");
    }

    #[test]
    fn test_color_choice_default_is_auto() {
        assert!(matches!(ColorChoice::default(), ColorChoice::Auto));
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["crowdsettle", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(_)));
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_global_flags() {
        let cli =
            Cli::try_parse_from(["crowdsettle", "--json", "-q", "-vv", "run"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_color_never() {
        let cli = Cli::try_parse_from(["crowdsettle", "--color", "never", "run"]).unwrap();
        assert!(matches!(cli.color, ColorChoice::Never));
    }

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from(["crowdsettle", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(args.database.is_none());
        assert!(!args.no_live);
    }

    #[test]
    fn test_run_args_overrides() {
        let cli = Cli::try_parse_from([
            "crowdsettle",
            "run",
            "-c",
            "/etc/crowdsettle.toml",
            "--log-level",
            "debug",
            "--json-logs",
            "--no-live",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("/etc/crowdsettle.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert!(args.no_live);
    }

    #[test]
    fn test_score_args() {
        let cli = Cli::try_parse_from([
            "crowdsettle",
            "score",
            "market.json",
            "--ai-score",
            "60",
            "--seed",
            "7",
        ])
        .unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.file, PathBuf::from("market.json"));
        assert_eq!(args.ai_score, 60);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn test_score_defaults_to_neutral_ai() {
        let cli = Cli::try_parse_from(["crowdsettle", "score", "m.json"]).unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.ai_score, 50);
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_score_rejects_out_of_range_ai() {
        let result = Cli::try_parse_from(["crowdsettle", "score", "m.json", "--ai-score", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_jobs_subcommands() {
        let cli = Cli::try_parse_from(["crowdsettle", "jobs", "failed"]).unwrap();
        assert!(matches!(cli.command, Commands::Jobs(JobsCommand::Failed(_))));

        let cli = Cli::try_parse_from(["crowdsettle", "jobs", "retry", "job-1"]).unwrap();
        let Commands::Jobs(JobsCommand::Retry(args)) = cli.command else {
            panic!("expected jobs retry");
        };
        assert_eq!(args.id, "job-1");

        let cli = Cli::try_parse_from(["crowdsettle", "jobs", "enqueue", "m-9"]).unwrap();
        let Commands::Jobs(JobsCommand::Enqueue(args)) = cli.command else {
            panic!("expected jobs enqueue");
        };
        assert_eq!(args.market, "m-9");
    }

    #[test]
    fn test_parse_check_config() {
        let cli =
            Cli::try_parse_from(["crowdsettle", "check", "config", "--config", "x.toml"]).unwrap();
        let Commands::Check(CheckCommand::Config(arg)) = cli.command else {
            panic!("expected check config");
        };
        assert_eq!(arg.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["crowdsettle"]).is_err());
    }
}
