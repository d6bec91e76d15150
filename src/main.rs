use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_context::build::BuildPipeline;
use agent_context::config::DirPolicy;
use agent_context::supervisor::{WatchCommand, WatcherSupervisor};
use agent_context::tools::ToolDispatcher;
use agent_context::{api, init, mcp, validate, watch};

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "agent-context")]
#[command(about = "A CLI and server for managing and serving agent context.")]
#[command(version)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new project
    Init {
        /// Replace an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Build the physical agent files
    Build,
    /// Watch for changes and rebuild files
    Watch,
    /// Validate that the generated files are up-to-date
    Validate,
    /// Start the interactive MCP server
    Serve {
        /// Use stdio for communication instead of HTTP
        #[arg(long)]
        stdio: bool,

        /// Port for the HTTP server (defaults to $PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Fall back to docs/agent-partials and docs/agent-templates when
        /// the configuration file cannot be read
        #[arg(long)]
        default_dirs: bool,
    },
}

/// Initialize tracing. Everything goes to stderr: stdout is the protocol
/// channel in stdio mode and stays clean for piping otherwise.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "agent_context=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { force } => {
            for path in init::init(&root, force)? {
                tracing::info!("Created {}", path.display());
            }
        }
        Commands::Build => {
            tracing::info!("Building agent context files...");
            let summary = BuildPipeline::new(&root).build()?;
            if !summary.skipped.is_empty() {
                tracing::warn!(
                    "{} output(s) skipped because their template is missing",
                    summary.skipped.len()
                );
            }
        }
        Commands::Watch => {
            watch::watch(&root).await?;
        }
        Commands::Validate => {
            tracing::info!("Validating generated files...");
            let result = validate::check(&BuildPipeline::new(&root))?;
            if !result.is_up_to_date() {
                for problem in &result.problems {
                    tracing::error!("{}", problem);
                }
                return Ok(ExitCode::FAILURE);
            }
            tracing::info!("All generated files are up-to-date.");
        }
        Commands::Serve {
            stdio,
            port,
            default_dirs,
        } => {
            let policy = if default_dirs {
                DirPolicy::FallbackToDefaults
            } else {
                DirPolicy::from_env()
            };
            let supervisor = WatcherSupervisor::new(WatchCommand::current_exe(&root)?);
            let dispatcher = ToolDispatcher::new(&root, policy, supervisor);

            if stdio {
                mcp::run_stdio_server(dispatcher).await?;
            } else {
                let port = port
                    .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
                    .unwrap_or(DEFAULT_PORT);
                let app = api::create_router(dispatcher);
                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
                tracing::info!("MCP HTTP Server listening on port {}", port);
                axum::serve(listener, app).await?;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
