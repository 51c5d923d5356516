use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use surfr::actions::{ActionContext, ActionRegistry};
use surfr::browser::ChromeLauncher;
use surfr::config::Config;
use surfr::llm::{AnthropicClient, AnthropicConfig, LlmClient};
use surfr::transcript::{ConsoleTranscript, MarkdownTranscript, MultiTranscript};
use surfr::{Agent, TaskOutcome, Termination};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surfr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("surfr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, mut config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            task,
            max_attempts,
            headed,
            instructions,
            transcript,
        } => {
            if let Some(n) = max_attempts {
                config.agent.max_attempts = *n;
            }
            if *headed {
                config.browser.headless = false;
            }
            if let Some(path) = instructions {
                config.agent.instructions_path = Some(path.clone());
            }
            handle_run_command(task, transcript.as_ref(), cli.is_verbose(), &config).await
        }
        Commands::Actions => handle_actions_command(&config),
    }
}

async fn handle_run_command(task: &str, transcript: Option<&PathBuf>, verbose: bool, config: &Config) -> Result<()> {
    info!("Running task: {}", task);

    let client = AnthropicClient::new(AnthropicConfig::from(&config.llm)).context("Failed to create LLM client")?;
    if !client.is_ready() {
        eyre::bail!("LLM client is not ready: set ${} to a non-empty API key", config.llm.api_key_env);
    }
    info!("Using model: {}", client.model());
    let launcher = ChromeLauncher::new(config.browser.clone());

    let markdown = match transcript {
        Some(path) => MarkdownTranscript::new(path),
        None => MarkdownTranscript::in_dir(&config.transcript.dir),
    };
    println!("{} {}", "Transcript:".dimmed(), markdown.path().display());

    let mut sinks = MultiTranscript::new().with(Box::new(markdown));
    if config.transcript.console {
        sinks.push(Box::new(ConsoleTranscript::new().verbose(verbose)));
    }

    let mut agent = Agent::from_config(config, Arc::new(client), Box::new(launcher))
        .context("Invalid agent configuration")?
        .with_transcript(Box::new(sinks));
    if let Some(text) = config.load_instructions()? {
        agent = agent.with_instructions(text);
    }

    let result = agent.run_task(task).await;
    if let Err(e) = agent.close().await {
        log::warn!("Failed to close browser: {}", e);
    }
    let outcome = result.context("Task failed")?;

    println!();
    println!("{}", outcome.text);
    println!("{}", outcome_line(&outcome));
    let usage = agent.usage();
    info!(
        "Token usage: {} in, {} out",
        usage.input_tokens, usage.output_tokens
    );
    Ok(())
}

/// Final status line; the count matches the transcript's `TaskCompleted`
fn outcome_line(outcome: &TaskOutcome) -> String {
    let label = match outcome.termination {
        Termination::Completed => "Completed".green().bold(),
        Termination::BudgetExhausted => "Stopped: attempt budget exhausted".yellow().bold(),
    };
    format!("{} after {} attempt(s)", label, outcome.iterations())
}

fn handle_actions_command(config: &Config) -> Result<()> {
    info!("Listing actions");
    let registry = ActionRegistry::standard(ActionContext::from_config(&config.timeouts, &config.browser))
        .context("Failed to build action registry")?;

    for definition in registry.definitions() {
        println!("{}", definition.name.cyan().bold());
        println!("  {}", definition.description);
        let params = serde_json::to_string_pretty(&definition.input_schema["properties"])?;
        for line in params.lines() {
            println!("    {}", line.dimmed());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_line_counts_every_pass() {
        colored::control::set_override(false);
        let outcome = TaskOutcome {
            text: "Done.".to_string(),
            attempts_used: 1,
            termination: Termination::Completed,
        };
        assert_eq!(outcome_line(&outcome), "Completed after 2 attempt(s)");

        let outcome = TaskOutcome {
            text: "Still going".to_string(),
            attempts_used: 3,
            termination: Termination::BudgetExhausted,
        };
        assert_eq!(
            outcome_line(&outcome),
            "Stopped: attempt budget exhausted after 3 attempt(s)"
        );
    }
}
