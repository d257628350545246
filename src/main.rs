#![forbid(unsafe_code)]
//! protosync command line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use protosync::commands::{
    execute_add_api, execute_add_route, execute_add_rpc, execute_add_svc, execute_add_task,
    execute_gen, AddApiOptions, AddRouteOptions, AddRpcOptions, AddSvcOptions, AddTaskOptions,
    GenOptions,
};
use protosync::Config;

#[derive(Parser)]
#[command(name = "protosync")]
#[command(about = "Schema-driven code generation and reconciliation for Rust services")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = protosync::config::CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tag injection, metadata generation and reconciliation
    Gen {
        /// Schema file, directory, or `*.proto` pattern
        schema: Option<PathBuf>,

        /// Output directory for generated metadata artifacts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base directory for `@emit_to:` targets
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Run rustfmt over generated and modified Rust files
        #[arg(long)]
        format: bool,

        /// External wire-binding compiler invoked on the injected
        /// intermediate document
        #[arg(long)]
        compiler: Option<String>,

        /// Directory receiving the rate rule module
        #[arg(long)]
        rate_output: Option<PathBuf>,
    },

    /// Append declarations to a schema document
    #[command(subcommand)]
    Add(AddCommands),
}

#[derive(Subcommand)]
enum AddCommands {
    /// Append a route-group service
    Route {
        /// Schema document to modify
        file: PathBuf,
        /// Service name
        name: String,
        /// Route prefix (`/api/member`)
        #[arg(long, default_value = "")]
        prefix: String,
        /// Handler target path
        #[arg(long, default_value = protosync::context::DEFAULT_EMIT_TO)]
        emit_to: String,
    },
    /// Append a plain service marked for generation
    Svc {
        file: PathBuf,
        name: String,
        #[arg(long, default_value = "src/service/impl_service.rs")]
        emit_to: String,
    },
    /// Append an api rpc (with request/response messages) to a route group
    Api {
        file: PathBuf,
        /// Route-group service name
        group: String,
        /// Rpc name
        name: String,
        /// HTTP method (defaults to POST)
        #[arg(long)]
        method: Option<String>,
    },
    /// Append a plain rpc (with request/response messages) to a service
    Rpc {
        file: PathBuf,
        service: String,
        name: String,
    },
    /// Append a scheduled task rpc, creating the task service if needed
    Task {
        file: PathBuf,
        service: String,
        name: String,
        #[arg(long, default_value = "src/tasks/mod.rs")]
        emit_to: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Gen {
            schema,
            output,
            project_root,
            format,
            compiler,
            rate_output,
        } => {
            let config = Config::load(&cli.config).unwrap_or_default();
            let summary = execute_gen(
                config,
                GenOptions {
                    schema_path: schema,
                    output_dir: output,
                    project_root,
                    format,
                    compiler_cmd: compiler,
                    rate_output,
                },
            )?;
            Ok(if summary.ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Add(add) => {
            match add {
                AddCommands::Route {
                    file,
                    name,
                    prefix,
                    emit_to,
                } => execute_add_route(AddRouteOptions {
                    file,
                    name,
                    prefix,
                    emit_to,
                })?,
                AddCommands::Svc { file, name, emit_to } => {
                    execute_add_svc(AddSvcOptions { file, name, emit_to })?
                }
                AddCommands::Api {
                    file,
                    group,
                    name,
                    method,
                } => execute_add_api(AddApiOptions {
                    file,
                    group,
                    name,
                    method,
                })?,
                AddCommands::Rpc {
                    file,
                    service,
                    name,
                } => execute_add_rpc(AddRpcOptions {
                    file,
                    service,
                    name,
                })?,
                AddCommands::Task {
                    file,
                    service,
                    name,
                    emit_to,
                } => execute_add_task(AddTaskOptions {
                    file,
                    service,
                    name,
                    emit_to,
                })?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
