//! CLI Tooling
//!
//! Command-line interface for docdesk. Every command runs against one
//! workspace; the chat service is wired lazily so configuration commands work
//! without provider credentials.

use crate::config::{ConfigLoader, DocdeskConfig};
use crate::error::ApiError;
use crate::logging::{resolve_log_file_path, LoggingConfig};
use crate::provider::{api_key_status, validate_provider};
use crate::service::{ChatService, Reply};
use crate::tooling::format::{
    format_agent_list_text, format_agent_status_text, format_build_outcome_text,
    format_process_text, format_provider_validation_text, format_reconcile_text, to_json,
};
use crate::tooling::server;
use clap::{Parser, Subcommand};
use dialoguer::Input;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// docdesk CLI - ask questions of your documents
#[derive(Parser)]
#[command(name = "docdesk")]
#[command(about = "Document-grounded question answering with one agent per document")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Load or build document indexes
    Process {
        /// Process only this agent
        #[arg(long)]
        agent: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Ask one question
    Chat {
        /// Ask this agent directly instead of routing by name
        #[arg(long)]
        agent: Option<String>,
        /// Question text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Interactive conversation
    Repl {
        /// Talk to this agent only
        #[arg(long)]
        agent: Option<String>,
    },
    /// Start the HTTP server
    Serve {
        /// Bind host (default: server.host from config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Reconcile agents with the documents directory
    Create {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List agents and their index state
    List {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one agent
    Status {
        /// Agent name
        name: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (secrets masked)
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate configuration and provider settings
    Validate,
}

/// Workspace-scoped command runner.
pub struct CliContext {
    workspace_root: PathBuf,
    config: DocdeskConfig,
    service: Mutex<Option<Arc<ChatService>>>,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let workspace_root = dunce::canonicalize(&workspace_root).map_err(|e| {
            ApiError::ConfigError(format!(
                "Workspace root {} is not accessible: {}",
                workspace_root.display(),
                e
            ))
        })?;
        let config = ConfigLoader::load_for(&workspace_root, config_path.as_deref())?;
        Ok(Self {
            workspace_root,
            config,
            service: Mutex::new(None),
        })
    }

    /// Context around an already wired service.
    pub fn with_service(workspace_root: PathBuf, config: DocdeskConfig, service: Arc<ChatService>) -> Self {
        Self {
            workspace_root,
            config,
            service: Mutex::new(Some(service)),
        }
    }

    pub fn config(&self) -> &DocdeskConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Logging settings with CLI flags folded over the config file.
    pub fn logging_config(&self, cli: &Cli) -> LoggingConfig {
        let mut logging = self.config.logging.clone();
        if cli.verbose {
            logging.level = "debug".to_string();
            logging.output = "stderr".to_string();
        }
        if let Some(level) = &cli.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            logging.output = output.clone();
        }
        if let Ok(path) = resolve_log_file_path(
            cli.log_file.clone(),
            logging.file.clone(),
            Some(&self.workspace_root),
        ) {
            logging.file = Some(path);
        }
        logging
    }

    fn service(&self) -> Result<Arc<ChatService>, ApiError> {
        let mut slot = self.service.lock();
        if let Some(service) = slot.as_ref() {
            return Ok(service.clone());
        }
        let service = Arc::new(ChatService::from_config(&self.config, &self.workspace_root)?);
        *slot = Some(service.clone());
        Ok(service)
    }

    /// Execute a command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Agents { command } => self.handle_agents(command).await,
            Commands::Process { agent, format } => self.handle_process(agent.as_deref(), format).await,
            Commands::Chat { agent, query } => {
                let query = query.join(" ");
                let reply = self.ask(agent.as_deref(), &query).await?;
                Ok(render_reply(&reply))
            }
            Commands::Repl { agent } => self.handle_repl(agent.as_deref()).await,
            Commands::Serve { host, port } => {
                let host = host.clone().unwrap_or_else(|| self.config.server.host.clone());
                let port = port.unwrap_or(self.config.server.port);
                server::serve(self.service()?, &host, port).await?;
                Ok("Server stopped".to_string())
            }
            Commands::Config { command } => self.handle_config(command),
        }
    }

    async fn ask(&self, agent: Option<&str>, query: &str) -> Result<Reply, ApiError> {
        let service = self.service()?;
        match agent {
            Some(name) => service.chat_with_agent(name, query).await,
            None => service.chat(query).await,
        }
    }

    async fn handle_agents(&self, command: &AgentCommands) -> Result<String, ApiError> {
        let service = self.service()?;
        match command {
            AgentCommands::Create { format } => {
                let report = service.create_agents()?;
                info!(agents = report.agent_count, issues = report.issues.len(), "Agents reconciled");
                match format.as_str() {
                    "json" => to_json(&report),
                    _ => Ok(format_reconcile_text(&report)),
                }
            }
            AgentCommands::List { format } => {
                let statuses = service.list_agents()?;
                match format.as_str() {
                    "json" => to_json(&statuses),
                    _ => Ok(format_agent_list_text(&statuses)),
                }
            }
            AgentCommands::Status { name, format } => {
                let status = service.get_agent_status(name)?;
                match format.as_str() {
                    "json" => to_json(&status),
                    _ => Ok(format_agent_status_text(&status)),
                }
            }
        }
    }

    async fn handle_process(&self, agent: Option<&str>, format: &str) -> Result<String, ApiError> {
        let service = self.service()?;
        match agent {
            Some(name) => {
                let outcome = service.process_agent(name).await?;
                match format {
                    "json" => to_json(&outcome),
                    _ => Ok(format_build_outcome_text(name, &outcome)),
                }
            }
            None => {
                let report = service.process_all_documents().await?;
                match format {
                    "json" => to_json(&report),
                    _ => Ok(format_process_text(&report)),
                }
            }
        }
    }

    async fn handle_repl(&self, agent: Option<&str>) -> Result<String, ApiError> {
        let service = self.service()?;
        let names = service.registry().names();
        println!("Document chat. Type 'exit' to quit.");
        if agent.is_none() && !names.is_empty() {
            println!("Agents: {}", names.join(", "));
        }

        loop {
            let line = tokio::task::spawn_blocking(|| {
                Input::<String>::new()
                    .with_prompt("You")
                    .allow_empty(true)
                    .interact_text()
            })
            .await
            .map_err(|e| ApiError::ConfigError(format!("Input task failed: {}", e)))?
            .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_exit(line) {
                break;
            }
            match self.ask(agent, line).await {
                Ok(reply) => println!("{}\n", render_reply(&reply)),
                Err(e @ ApiError::AgentNotFound { .. }) => {
                    println!("{}\n", e);
                    break;
                }
                Err(e) => println!("Error: {}\n", e),
            }
        }
        Ok("Goodbye!".to_string())
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show { format } => {
                let masked = masked_config(&self.config);
                match format.as_str() {
                    "json" => to_json(&masked),
                    _ => toml::to_string_pretty(&masked)
                        .map_err(|e| ApiError::ConfigError(format!("Failed to render TOML: {}", e))),
                }
            }
            ConfigCommands::Validate => {
                self.config.validate()?;
                let result = validate_provider(&self.config.provider);
                let text =
                    format_provider_validation_text(&result, &api_key_status(&self.config.provider));
                if result.is_valid() {
                    Ok(text)
                } else {
                    Err(ApiError::ConfigError(format!("provider validation failed\n\n{}", text)))
                }
            }
        }
    }
}

fn is_exit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit")
}

fn render_reply(reply: &Reply) -> String {
    match reply.agent() {
        Some(agent) => format!("[{}] {}", agent, reply.render()),
        None => reply.render(),
    }
}

/// Keep the first and last few characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn masked_config(config: &DocdeskConfig) -> DocdeskConfig {
    let mut masked = config.clone();
    if let Some(key) = masked.provider.api_key.as_mut() {
        *key = mask_secret(key);
    }
    masked
}
