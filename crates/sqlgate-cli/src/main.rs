// crates/sqlgate-cli/src/main.rs
// ============================================================================
// Module: sqlgate CLI Entry Point
// Description: Command dispatcher for the gateway server and local tooling.
// Purpose: Serve the HTTP gateway and run one-off statements from a shell.
// Dependencies: clap, sqlgate-config, sqlgate-core, sqlgate-server, tokio.
// ============================================================================

//! ## Overview
//! The sqlgate CLI starts the HTTP gateway, validates configuration, issues
//! identifiers, and executes single statements through the same pipeline the
//! server uses. Security posture: identifiers are bearer secrets; the CLI
//! prints them only when asked to issue one.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use sqlgate_config::GatewayConfig;
use sqlgate_core::ExecuteRequest;
use sqlgate_core::Gateway;
use sqlgate_core::ResponseEnvelope;
use sqlgate_core::StoreRoot;
use sqlgate_core::TenantId;
use sqlgate_server::GatewayServer;
use sqlgate_store_sqlite::SqliteTenantStore;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "sqlgate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Identifier utilities.
    Id {
        /// Selected identifier subcommand.
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Execute one statement against a tenant store.
    Exec(ExecCommand),
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to sqlgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override `server.bind`.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a sqlgate configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to sqlgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Identifier subcommands.
#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Print a freshly generated identifier.
    New,
}

/// Arguments for `exec`.
#[derive(Args, Debug)]
struct ExecCommand {
    /// Tenant identifier.
    #[arg(long, value_name = "ID")]
    id: String,
    /// SQL text for a single statement.
    #[arg(long, value_name = "SQL")]
    sql: String,
    /// Optional config file path (defaults to sqlgate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("sqlgate {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Id {
            command,
        } => command_id(&command),
        Commands::Exec(command) => command_exec(command).await,
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref(), command.bind)?;
    let bind = config.server.bind.clone();
    let server = tokio::task::spawn_blocking(move || GatewayServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("sqlgate: serving on {bind}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration and applies a bind override.
fn load_config(path: Option<&Path>, bind: Option<String>) -> CliResult<GatewayConfig> {
    let mut config = GatewayConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(bind) = bind {
        config.server.bind = bind;
        config.validate().map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    }
    Ok(config)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref(), None)?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Identifier Command
// ============================================================================

/// Dispatches identifier subcommands.
fn command_id(command: &IdCommand) -> CliResult<ExitCode> {
    match command {
        IdCommand::New => {
            let id = TenantId::generate();
            write_stdout_line(id.as_str())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Exec Command
// ============================================================================

/// Executes one statement and prints the response envelope.
async fn command_exec(command: ExecCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref(), None)?;
    let envelope = tokio::task::spawn_blocking(move || {
        execute_statement(&config, ExecuteRequest::new(command.id, command.sql))
    })
    .await
    .map_err(|err| CliError::new(format!("exec failed: {err}")))??;
    let payload = serde_json::to_string_pretty(&envelope)
        .map_err(|err| CliError::new(format!("failed to encode response: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if envelope.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs one request through the gateway pipeline against the configured root.
fn execute_statement(
    config: &GatewayConfig,
    request: ExecuteRequest,
) -> CliResult<ResponseEnvelope> {
    let root = StoreRoot::establish(&config.storage.root)
        .map_err(|err| CliError::new(format!("storage root unavailable: {err}")))?;
    let gateway = Gateway::new(root, SqliteTenantStore::new(config.storage.store_config()));
    Ok(ResponseEnvelope::from_result(&gateway.execute(&request)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
