//! Strictly Scores - Unified CLI
//!
//! Leaderboard server plus maintenance commands.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use std::net::SocketAddr;
use strictly_scores::{AppState, Identity, RankingService, ScoreRepository, ServiceConfig, router};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                config.set_port(port);
            }
            if let Some(host) = host {
                config.set_host(host);
            }
            serve(config).await
        }
        Command::Migrate => migrate(&config),
        Command::AddAccount { nickname } => add_account(&config, nickname),
        Command::Leaderboard { limit } => print_leaderboard(&config, limit),
        Command::History { nickname, limit } => print_history(&config, &nickname, limit),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_scores=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Defaults, then the config file, then environment, then flags.
fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    let mut config = config.with_env()?;
    if let Some(db_path) = &cli.db_path {
        config.set_database_url(db_path.clone());
    }
    Ok(config)
}

fn open_repository(config: &ServiceConfig) -> Result<ScoreRepository> {
    Ok(ScoreRepository::new(config.database_url().clone())?)
}

/// Run the HTTP leaderboard server
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
async fn serve(config: ServiceConfig) -> Result<()> {
    let repository = open_repository(&config)?;
    repository.initialize()?;

    let app = router(AppState::from_config(repository, &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!(
        addr = %config.bind_addr(),
        allowed_origins = config.allowed_origins().len(),
        "Leaderboard server ready"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn migrate(config: &ServiceConfig) -> Result<()> {
    open_repository(config)?.initialize()?;
    println!("Database ready at {}", config.database_url());
    Ok(())
}

fn add_account(config: &ServiceConfig, nickname: String) -> Result<()> {
    let repository = open_repository(config)?;
    repository.initialize()?;
    if repository.get_account_by_nickname(&nickname)?.is_some() {
        bail!("Nickname '{}' is already taken", nickname);
    }
    let account = repository.create_account(nickname)?;
    println!("Account {} created for '{}'", account.id(), account.nickname());
    Ok(())
}

fn print_leaderboard(config: &ServiceConfig, limit: Option<i64>) -> Result<()> {
    let ranking = RankingService::new(open_repository(config)?);
    let entries = ranking.leaderboard(limit)?;
    if entries.is_empty() {
        println!("No ranked scores yet");
    }
    for entry in entries {
        println!(
            "{:>3}. {:<20} {:>12} {:>6} moves  {}",
            entry.rank, entry.nickname, entry.time, entry.moves, entry.created_at
        );
    }
    Ok(())
}

fn print_history(config: &ServiceConfig, nickname: &str, limit: Option<i64>) -> Result<()> {
    let repository = open_repository(config)?;
    let account = repository
        .get_account_by_nickname(nickname)?
        .with_context(|| format!("No account named '{}'", nickname))?;

    let ranking = RankingService::new(repository);
    let entries = ranking.history(&Identity::Account(*account.id()), limit)?;
    if entries.is_empty() {
        println!("No scores for '{}'", nickname);
    }
    for entry in entries {
        println!("{}  {:>12} {:>6} moves", entry.created_at, entry.time, entry.moves);
    }
    Ok(())
}
