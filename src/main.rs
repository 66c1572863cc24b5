use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use cinebot::agent::Agent;
use cinebot::llm::{AnthropicClient, LlmClient};
use cinebot::session::{SessionManager, UserId};
use cinebot::tools::ToolRegistry;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinebot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("cinebot.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Apply the configured level unless RUST_LOG already chose one
fn apply_log_level(config: &Config) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let level = config
        .log_level
        .as_deref()
        .and_then(|level| level.parse().ok())
        .unwrap_or(log::LevelFilter::Info);
    log::set_max_level(level);
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => run_chat(config, config.access.local_user).await,
        Some(Commands::Chat { user }) => run_chat(config, user.unwrap_or(config.access.local_user)).await,
        Some(Commands::Tools) => print_tools(),
        Some(Commands::Config) => print_config(config),
    }
}

fn print_tools() -> Result<()> {
    let registry = ToolRegistry::standard();
    for name in registry.tool_names() {
        if let Some(tool) = registry.get(name) {
            println!("{} {}", name.green(), format!("(needs {})", tool.capability()).dimmed());
        }
    }
    println!("{}", serde_json::to_string_pretty(registry.definitions())?);
    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize config")?);
    Ok(())
}

async fn run_chat(config: &Config, user: UserId) -> Result<()> {
    let sessions: SessionManager<Agent> = SessionManager::new(config.access.allowed_users.clone());
    if !sessions.is_allowed(user) {
        println!("{} user {} is not on the allow-list", "Denied:".red(), user);
        return Ok(());
    }

    let llm: Arc<dyn LlmClient> =
        Arc::new(AnthropicClient::new(config.anthropic_config()).context("Failed to create LLM client")?);
    let registry = Arc::new(ToolRegistry::standard());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    println!(
        "{} using {} - /reset clears the conversation, /quit exits",
        "Cinebot".cyan().bold(),
        llm.model()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else { break };
        let text = line.trim();

        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                if let Some(session) = sessions.get(user) {
                    session.lock().await.reset();
                }
                println!("{}", "Conversation cleared.".yellow());
                continue;
            }
            _ => {}
        }

        let factory = || async {
            match config.build_services() {
                Ok(services) => {
                    info!("Services for user {}: {:?}", user, services.configured());
                    Some(Agent::with_config(llm.clone(), services, config.agent_config()).with_registry(registry.clone()))
                }
                Err(e) => {
                    warn!("Failed to build services for user {}: {:#}", user, e);
                    None
                }
            }
        };

        let session = match sessions.get_or_create(user, factory).await {
            Ok(session) => session,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                continue;
            }
        };

        let request = shutdown.child_token();
        let timer = {
            let request = request.clone();
            let deadline = config.request_timeout();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                request.cancel();
            })
        };

        let reply = session.lock().await.handle_message(text, &request).await;
        timer.abort();

        match reply {
            Ok(reply) => println!("{}\n", reply),
            Err(e) => println!("{} {}\n", "Error:".red(), e),
        }
    }

    sessions.shutdown().await;
    info!("Chat ended");
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
    apply_log_level(&config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
