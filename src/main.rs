//! agentrun binary entry point.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use agentrun::approval::{ApprovalPolicy, AutoApprove, ToolAllowList};
use agentrun::auth::{CachedCredential, ChainedCredential};
use agentrun::cli::{init_logging, resolve_prompt, Cli};
use agentrun::config::AgentConfig;
use agentrun::conversation::Conversation;
use agentrun::error::AgentRunError;
use agentrun::orchestrator::RunEvent;
use agentrun::transcript::render;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_clean_exit() => {
            println!("{err}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AgentRunError> {
    let config = AgentConfig::load(cli.config.as_deref())?
        .merge(cli.overrides())
        .validate()?;

    let policy: Arc<dyn ApprovalPolicy> = if cli.allow_tools.is_empty() {
        Arc::new(AutoApprove::new())
    } else {
        Arc::new(ToolAllowList::new(cli.allow_tools.clone()))
    };
    let credential = Arc::new(CachedCredential::new(Arc::new(
        ChainedCredential::default_chain(),
    )));
    let sink = Arc::new(|event: RunEvent| {
        if let RunEvent::ThreadCreated { thread_id } = event {
            println!("Created thread, ID: {thread_id}");
        }
    });
    let conversation = Conversation::from_config(&config, credential)?
        .with_policy(policy)
        .with_event_sink(sink);

    let agent = conversation.resolve_agent().await?;
    let prompt = match cli.prompt {
        Some(prompt) => resolve_prompt(Some(&prompt)),
        None => read_prompt().await?,
    };

    let cancel = conversation.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling run");
            cancel.cancel();
        }
    });

    let outcome = conversation.run_with_agent(&agent, &prompt).await?;
    for line in render(&outcome.messages) {
        println!("{line}");
    }
    Ok(())
}

async fn read_prompt() -> Result<String, AgentRunError> {
    print!("Please enter your prompt: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(resolve_prompt(Some(&line)))
}
