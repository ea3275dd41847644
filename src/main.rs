//! Flowgrid CLI: serve the gateway, or execute a workflow file once

use anyhow::Context;
use clap::{Parser, Subcommand};
use flowgrid_agent::AgentExecutor;
use flowgrid_core::{NodeKind, RunContext, RunId, StatusBus, Workflow};
use flowgrid_engine::{EngineServices, ExecutorRegistry, MemoryJournal, RunDriver};
use flowgrid_gateway::{start_gateway, AppState, ChannelTokens, GatewayConfig};
use flowgrid_llm::HttpProviderFactory;
use flowgrid_store::{CredentialVault, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "flowgrid", about = "Workflow graph execution engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gateway (execute event, trigger webhooks, status channel)
    Serve {
        #[arg(long, default_value_t = 8090)]
        port: u16,
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Directory of workflow JSON files to load at startup
        #[arg(long)]
        workflows: Option<PathBuf>,
    },
    /// Execute one workflow file and print the final context
    Run {
        /// Workflow JSON file
        file: PathBuf,
        /// Initial context as a JSON object
        #[arg(long)]
        input: Option<String>,
    },
}

fn vault() -> CredentialVault {
    match CredentialVault::from_env() {
        Ok(vault) => vault,
        Err(_) => {
            warn!("ENCRYPTION_KEY not set or invalid; using an ephemeral key");
            let key = format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            );
            CredentialVault::from_hex_key(&key).expect("generated key is 64 hex chars")
        }
    }
}

fn build_driver(store: Arc<MemoryStore>) -> Arc<RunDriver> {
    let services = Arc::new(EngineServices {
        credentials: store.clone(),
        inventory: store.clone(),
        orders: store,
        providers: Arc::new(HttpProviderFactory),
        http: reqwest::Client::new(),
    });
    let mut registry = ExecutorRegistry::builtin();
    registry.register(NodeKind::AiAgent, AgentExecutor);
    Arc::new(RunDriver::new(
        Arc::new(registry),
        Arc::new(MemoryJournal::new()),
        Arc::new(StatusBus::new()),
        services,
    ))
}

fn load_workflow(path: &PathBuf) -> anyhow::Result<Workflow> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowgrid=info,warn".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Serve { port, bind, workflows } => {
            let store = Arc::new(MemoryStore::new(vault()));
            if let Some(dir) = workflows {
                let mut loaded = 0usize;
                for entry in std::fs::read_dir(&dir)
                    .with_context(|| format!("reading {}", dir.display()))?
                {
                    let path = entry?.path();
                    if path.extension().is_some_and(|e| e == "json") {
                        store.insert_workflow(load_workflow(&path)?);
                        loaded += 1;
                    }
                }
                info!(count = loaded, "workflows loaded");
            }

            let driver = build_driver(store.clone());
            let state = AppState {
                workflows: store,
                driver,
                tokens: ChannelTokens::new(),
            };
            start_gateway(state, GatewayConfig { port, bind }).await
        }
        Command::Run { file, input } => {
            let workflow = load_workflow(&file)?;
            let store = Arc::new(MemoryStore::new(vault()));
            store.insert_workflow(workflow.clone());
            let driver = build_driver(store);

            let initial = match input {
                Some(raw) => {
                    let map: serde_json::Map<String, serde_json::Value> =
                        serde_json::from_str(&raw).context("parsing --input")?;
                    RunContext::from_map(map)
                }
                None => RunContext::new(),
            };

            let run_id = RunId::generate();
            info!(run = %run_id, workflow = %workflow.id, org = %workflow.org_id, "executing");
            let context = driver.execute(&workflow, &run_id, initial).await?;
            println!("{}", serde_json::to_string_pretty(context.as_map())?);
            Ok(())
        }
    }
}
