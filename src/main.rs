use clap::Parser;
use crowdsettle::adapter::inbound::cli::command::{
    CheckCommand, Cli, ColorChoice, Commands, JobsCommand,
};
use crowdsettle::adapter::inbound::cli::output::{self, OutputConfig};
use crowdsettle::adapter::inbound::cli::{check, jobs, run, score};
use crowdsettle::error::Result;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Err(e) = dispatch(cli.command).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Score(args) => score::execute(&args),
        Commands::Jobs(JobsCommand::Failed(arg)) => jobs::execute_failed(&arg.config).await,
        Commands::Jobs(JobsCommand::Retry(args)) => jobs::execute_retry(&args).await,
        Commands::Jobs(JobsCommand::Enqueue(args)) => jobs::execute_enqueue(&args).await,
        Commands::Check(CheckCommand::Config(arg)) => check::config::execute_config(&arg.config),
    }
}
