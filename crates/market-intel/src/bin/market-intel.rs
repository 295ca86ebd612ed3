//! Market intelligence CLI
//!
//! Runs the crew once and prints the strategy report.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! export SERPER_API_KEY=...
//!
//! cargo run --bin market-intel -p market-intel
//! cargo run --bin market-intel -p market-intel -- run-with-trigger '{"source": "webhook"}'
//! ```

use clap::{Parser, Subcommand};
use crew_utils::{Settings, init_tracing};
use market_intel::StrategyReport;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "market-intel")]
#[command(about = "Scan a market, analyze competitors and write a strategy report", long_about = None)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the crew on the default topic (the default)
    Run,
    /// Run the crew with a JSON trigger payload
    RunWithTrigger {
        /// JSON payload handed to the crew as `crewai_trigger_payload`
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format, args.verbose);

    info!(model = %settings.model, "Starting market-intel");

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let output = market_intel::run(&settings).await?;
            match output.typed::<StrategyReport>() {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(_) => println!("{}", output.raw),
            }
            info!(tokens = output.token_usage.total(), "Crew run finished");
        }
        Command::RunWithTrigger { payload } => {
            let output = market_intel::run_with_trigger(&settings, payload.as_deref()).await?;
            println!("{}", output.raw);
            info!(tokens = output.token_usage.total(), "Triggered crew run finished");
        }
    }

    Ok(())
}
