//! `agui` binary entry point.

use std::sync::Arc;

use agui_client::cli::{ChatArgs, Cli, Commands};
use agui_client::config::ClientConfig;
use agui_client::run::{RunController, RunEvent, RunEventPayload, RunStatus};
use agui_client::tools::ToolRegistry;
use agui_client::transport::HttpEventSource;
use agui_client::types::{ContextPayload, Message};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Chat(args) => handle_chat(cli.config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(
    config_path: Option<std::path::PathBuf>,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::load(config_path.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = Some(endpoint);
    }
    let context = match args.context {
        Some(raw) => ContextPayload::new(serde_json::from_str(&raw)?),
        None => ContextPayload::default(),
    };

    let source = Arc::new(HttpEventSource::new(&config)?);
    let sink = Arc::new(|event: RunEvent| {
        use std::io::Write;
        match &event.payload {
            RunEventPayload::TextDelta { delta, .. } => {
                print!("{delta}");
                let _ = std::io::stdout().flush();
            }
            RunEventPayload::StepStarted { step_name } => eprintln!("\n[step] {step_name}"),
            RunEventPayload::ToolCallStarted { tool_name, .. } => {
                eprintln!("\n[tool] {tool_name}");
            }
            RunEventPayload::Custom { name, value } => eprintln!("\n[{name}] {value}"),
            RunEventPayload::Diagnostic { message } => eprintln!("\n[warn] {message}"),
            RunEventPayload::RunErrored { message, .. } => eprintln!("\n[error] {message}"),
            _ => {}
        }
    });

    let mut controller = RunController::new(source, ToolRegistry::new())
        .with_config(&config)
        .with_event_sink(sink);
    if let Some(thread) = args.thread {
        controller = controller.with_thread_id(thread);
    }

    let mut prior = Vec::new();
    if let Some(system) = args.system {
        prior.push(Message::system(system));
    }

    let handle = controller.start(prior, Some(Message::user(args.prompt)), Vec::new(), context);
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.cancel();
            eprintln!("\ncanceled");
            return Ok(());
        }
    };

    println!();
    eprintln!("thread: {}", outcome.thread_id);

    match outcome.status {
        RunStatus::Errored => Err(outcome.error.unwrap_or_else(|| "run failed".into()).into()),
        RunStatus::Finished | RunStatus::Canceled => Ok(()),
    }
}
