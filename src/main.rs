//! route-dispatch operator CLI.
//!
//! Loads a route configuration and answers routing questions against it:
//! resolve a request path, build a URL, validate a custom rule, or keep a
//! registry hot-reloaded from file changes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use route_dispatch::config::ConfigWatcher;
use route_dispatch::lifecycle::{signals, start, Shutdown};
use route_dispatch::routing::{Params, Scope, TenantId};

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "Bidirectional URL routing for multi-tenant storefronts", long_about = None)]
struct Cli {
    /// Route configuration file (TOML). Built-in routes only when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value_t = 1)]
    tenant: u32,

    #[arg(short, long, default_value_t = 1)]
    locale: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request path and print the match as JSON
    Resolve { path: String },
    /// Build the URL of a route
    Build {
        route_id: String,
        /// Route parameter, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Query-string URL instead of the friendly one
        #[arg(long)]
        query: bool,
        #[arg(long, default_value = "")]
        anchor: String,
    },
    /// Check a custom rule against its route family
    Validate { route_id: String, rule: String },
    /// Keep the route table hot-reloaded until interrupted
    Watch,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got \"{raw}\""))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (config, registry) = start(cli.config.as_deref())?;
    let scope = Scope::new(cli.tenant, cli.locale);

    match cli.command {
        Commands::Resolve { path } => {
            let resolution = registry.router().resolve_path(&path, scope)?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            if resolution.is_not_found() {
                eprintln!("not found; fallback controller: {}", config.settings.not_found_controller);
            }
        }
        Commands::Build {
            route_id,
            params,
            query,
            anchor,
        } => {
            let params: Params = params.into_iter().collect();
            let url = registry
                .router()
                .build_with_anchor(&route_id, scope, &params, !query, &anchor)?;
            println!("{url}");
        }
        Commands::Validate { route_id, rule } => {
            match registry
                .router()
                .validate_template(TenantId(cli.tenant), &route_id, &rule)
            {
                Ok(()) => println!("ok"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Watch => {
            let path = cli
                .config
                .as_deref()
                .ok_or("watch needs --config")?;

            let shutdown = Arc::new(Shutdown::new());
            let mut stop = shutdown.subscribe();
            let signal_shutdown = shutdown.clone();
            tokio::spawn(async move { signals::forward_signals(&signal_shutdown).await });

            let (watcher, mut updates) = ConfigWatcher::new(path);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => {
                        if registry.reload_from_config(&new_config).is_ok() {
                            tracing::info!(
                                routes = registry.snapshot().table.route_count(),
                                "Route table reloaded"
                            );
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}
