use anyhow::Context;
use clap::{Parser, ValueEnum};
use masgent_agent::{ContextWindow, OpenAiBackend, SYSTEM_PROMPT};
use masgent_builtins::{register_builtins, ToolContext, WorkspaceLayout};
use masgent_cli::{
    DotenvCredentialStore, MasgentConfig, ModeDispatcher, PromptCredentialSource, StdConsole,
    FAREWELL,
};
use masgent_core::{CredentialResolver, EnvCredentialSource, MasgentError};
use masgent_materials::{MaterialsProjectClient, PotcarLibrary};
use masgent_tools::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "masgent", version, about = "Masgent: Materials Simulation Agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "masgent.toml")]
    config: PathBuf,

    /// Working directory for generated files (defaults to the current directory)
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Mode to start in
    #[arg(long, value_enum, default_value_t = StartMode::Structured)]
    mode: StartMode,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StartMode {
    Structured,
    Agent,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    if let Some(dir) = &cli.workdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Cannot use working directory '{}'", dir.display()))?;
    }
    let base_dir = std::env::current_dir().context("Cannot determine working directory")?;

    let env_file = base_dir.join(".env");
    match dotenvy::from_path(&env_file) {
        Ok(()) => debug!(path = %env_file.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let config = MasgentConfig::load(&cli.config)?;

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n\n{FAREWELL}\n");
            std::process::exit(0);
        }
    });

    let resolver = CredentialResolver::new()
        .with_source(Box::new(EnvCredentialSource))
        .with_source(Box::new(
            PromptCredentialSource::new(Box::new(StdConsole::new()))
                .with_store(Box::new(DotenvCredentialStore::new(env_file))),
        ));
    let credentials = match resolver.resolve().await {
        Ok(credentials) => credentials,
        Err(e @ MasgentError::Credential(_)) => {
            eprintln!("\n{e}. Exiting...\n");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let database = Arc::new(MaterialsProjectClient::new(
        config.materials_project.base_url.clone(),
        credentials.materials_api_key(),
    ));
    let layout = WorkspaceLayout::for_dir(&base_dir, &config.workspace);
    let mut tool_context = ToolContext::new(layout, database);
    if let Some(dir) = &config.vasp.potcar_dir {
        tool_context = tool_context.with_potcar_library(PotcarLibrary::new(dir));
    }

    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, Arc::new(tool_context))?;
    info!(count = registry.len(), base = %base_dir.display(), "Tools registered");

    let backend = Arc::new(OpenAiBackend::new(
        config.model.clone(),
        credentials.model_api_key(),
    ));
    let context = ContextWindow::new(config.model.max_history).with_system_prompt(SYSTEM_PROMPT);

    let mut dispatcher = ModeDispatcher::new(StdConsole::new(), Arc::new(registry), backend, context);
    if cli.mode == StartMode::Agent {
        dispatcher.enter_agent();
    }
    dispatcher.run().await?;
    Ok(())
}
