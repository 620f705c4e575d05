//! # tallyd: command usage tally daemon
//!
//! Composition root that wires the storage adapter into the usage services
//! and replays chat interactions read from stdin.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the tracing subscriber (logs go to stderr)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Seed the known command set
//! - Read one JSON interaction per stdin line and print reports on stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod dispatch;

use anyhow::Context;
use tally_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteCommandRepository, SqliteUsageRepository, SqliteUserRepository,
};
use tally_app::services::usage_service::UsageService;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dispatch::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Repositories
    let user_repo = SqliteUserRepository::new(pool.clone());
    let command_repo = SqliteCommandRepository::new(pool.clone());
    let usage_repo = SqliteUsageRepository::new(pool);

    // Services
    let service = UsageService::new(user_repo, command_repo, usage_repo);
    let dispatcher = Dispatcher::new(service, config.commands.statistics.as_str());

    let created = dispatcher
        .service()
        .commands()
        .seed(config.commands.known.iter().map(String::as_str))
        .await
        .context("failed to seed commands")?;
    tracing::info!(
        created,
        known = config.commands.known.len(),
        statistics = %config.commands.statistics,
        "tallyd ready, reading interactions from stdin"
    );

    let counted = dispatcher
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    tracing::info!(counted, "input closed, shutting down");

    Ok(())
}
