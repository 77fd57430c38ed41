use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::bootstrap;
use crate::config::AppConfig;
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::router::RouteTable;
use crate::server::HttpServer;

/// Command-line interface for the kickstart dispatcher
#[derive(Parser)]
#[command(name = "kickstart")]
#[command(about = "Route table tooling and a development server", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve a route file with the bundled handlers
    ///
    /// Reads `APP_*` variables (and `.env` in the working directory).
    Serve {
        /// Route declaration file (YAML or TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// Listen address, overriding `APP_ADDR`
        #[arg(long)]
        addr: Option<String>,

        /// Worker threads, overriding `APP_WORKERS`
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the compiled route table in matching order
    Routes {
        /// Route declaration file (YAML or TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// Prefix applied to every route
        #[arg(long, env = "APP_BASEHREF", default_value = "")]
        base_href: String,
    },
    /// Validate a route file; exits non-zero on the first invalid route
    Check {
        /// Route declaration file (YAML or TOML)
        #[arg(short, long)]
        routes: PathBuf,

        /// Prefix applied to every route
        #[arg(long, env = "APP_BASEHREF", default_value = "")]
        base_href: String,
    },
}

/// Execute a parsed command.
///
/// # Errors
///
/// Configuration, route loading or server startup failures.
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            routes,
            addr,
            workers,
        } => serve(&routes, addr, workers),
        Commands::Routes { routes, base_href } => {
            init_tool_logging();
            let table = load_table(&routes, &base_href)?;
            for line in table.into_router().dump_routes() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Check { routes, base_href } => {
            init_tool_logging();
            let table = load_table(&routes, &base_href)?;
            let handlers: BTreeSet<String> = table
                .all_routes()
                .iter()
                .flat_map(|r| {
                    r.guard_ids
                        .iter()
                        .chain(std::iter::once(&r.handler_id))
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                })
                .collect();
            println!("{}: {} route(s) OK", routes.display(), table.len());
            println!(
                "handler ids: {}",
                handlers.into_iter().collect::<Vec<_>>().join(", ")
            );
            Ok(())
        }
    }
}

fn serve(routes: &Path, addr: Option<String>, workers: Option<usize>) -> Result<()> {
    let mut config = AppConfig::load(Path::new(".")).context("Invalid configuration")?;
    if let Some(addr) = addr {
        config.addr = addr;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }

    init_logging(&config.log)?;
    info!(mode = %config.mode, addr = %config.addr, "Starting kickstart");

    let app = bootstrap(&config, routes)?;
    let handle = HttpServer::new(app.dispatcher, config.workers)
        .start(&config.addr)
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server worker panicked: {e:?}"))
}

fn load_table(routes: &Path, base_href: &str) -> Result<RouteTable> {
    RouteTable::from_file(routes, base_href)
        .with_context(|| format!("Failed to load routes from {}", routes.display()))
}

/// Warnings only; a subscriber installed earlier wins.
fn init_tool_logging() {
    init_logging(&LogConfig {
        log_level: "warn".to_string(),
        format: LogFormat::Pretty,
        include_location: false,
    })
    .ok();
}
