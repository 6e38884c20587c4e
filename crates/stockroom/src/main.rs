// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stockroom - admin client for soft-deletable backend resources.
//!
//! This is the binary entry point: lists active and trashed entities and
//! runs the soft-delete, restore, and permanent-delete workflows.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod console;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stockroom_config::StockroomConfig;
use stockroom_core::{EntityId, ModelName, Scope, StockroomError};

use crate::commands::{App, PageSelector};

/// Stockroom - admin client for soft-deletable backend resources.
#[derive(Parser, Debug)]
#[command(name = "stockroom", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List one page of a model's active or trashed entities.
    List {
        #[arg(value_parser = parse_model)]
        model: ModelName,
        /// Show the trash instead of active entities.
        #[arg(long)]
        trash: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        /// Field filter as `key=value`; repeatable.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Move an entity to the trash.
    Delete {
        #[command(flatten)]
        target: Target,
        /// Undo the delete immediately through the undo handle.
        #[arg(long)]
        undo: bool,
    },
    /// Restore a trashed entity.
    Restore {
        #[command(flatten)]
        target: Target,
    },
    /// Permanently delete a trashed entity.
    ForceDelete {
        #[command(flatten)]
        target: Target,
    },
    /// Restore several trashed entities.
    BulkRestore {
        #[command(flatten)]
        targets: Targets,
    },
    /// Permanently delete several trashed entities.
    BulkForceDelete {
        #[command(flatten)]
        targets: Targets,
    },
    /// Load and validate configuration, then exit.
    CheckConfig,
}

#[derive(Args, Debug)]
struct Target {
    #[arg(value_parser = parse_model)]
    model: ModelName,
    id: String,
    /// Page of the list the entity is on.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(Args, Debug)]
struct Targets {
    #[arg(value_parser = parse_model)]
    model: ModelName,
    #[arg(required = true)]
    ids: Vec<String>,
    /// Page of the list the entities are on.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

impl Targets {
    fn id_set(&self) -> BTreeSet<EntityId> {
        self.ids.iter().map(|id| EntityId::from(id.as_str())).collect()
    }
}

fn parse_model(raw: &str) -> Result<ModelName, String> {
    ModelName::new(raw).map_err(|e| e.to_string())
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => stockroom_config::load_and_validate_path(path),
        None => stockroom_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            stockroom_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let Some(command) = cli.command else {
        println!("stockroom: use --help for available commands");
        return;
    };

    if let Commands::CheckConfig = command {
        println!(
            "stockroom: config ok (api.base_url={}, cache.enabled={}, workflow.undo_window_secs={})",
            config.api.base_url, config.cache.enabled, config.workflow.undo_window_secs
        );
        return;
    }

    if !run(&config, cli.plain, command).await {
        std::process::exit(1);
    }
}

/// Runs one subcommand. Returns false if anything failed; failures have
/// already been reported by then.
async fn run(config: &StockroomConfig, plain: bool, command: Commands) -> bool {
    let mut app = match App::from_config(config, plain) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("stockroom: {err}");
            return false;
        }
    };

    // Ok(false) is a bulk request with at least one failed id.
    let result: Result<bool, StockroomError> = match command {
        Commands::List {
            model,
            trash,
            page,
            page_size,
            filters,
        } => {
            let scope = if trash { Scope::Trash } else { Scope::Active };
            let selector = PageSelector {
                page,
                page_size,
                filters: filters.into_iter().collect::<BTreeMap<_, _>>(),
            };
            app.list(model, scope, selector)
                .await
                .map(|rendered| {
                    print!("{rendered}");
                    true
                })
        }
        Commands::Delete { target, undo } => {
            app.delete(target.model, EntityId::from(target.id), target.page, undo)
                .await
                .map(|()| true)
        }
        Commands::Restore { target } => {
            app.restore(target.model, EntityId::from(target.id), target.page)
                .await
                .map(|()| true)
        }
        Commands::ForceDelete { target } => {
            app.force_delete(target.model, EntityId::from(target.id), target.page)
                .await
                .map(|()| true)
        }
        Commands::BulkRestore { targets } => {
            let ids = targets.id_set();
            app.bulk_restore(targets.model, ids, targets.page)
                .await
                .map(|outcome| outcome.failed.is_empty())
        }
        Commands::BulkForceDelete { targets } => {
            let ids = targets.id_set();
            app.bulk_force_delete(targets.model, ids, targets.page)
                .await
                .map(|outcome| outcome.failed.is_empty())
        }
        Commands::CheckConfig => Ok(true),
    };
    app.sign_out().await;
    matches!(result, Ok(true))
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stockroom={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
