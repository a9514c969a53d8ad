use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repovibe_api::api::{self, AppState};
use repovibe_api::config::AppConfig;
use repovibe_api::favorites::InMemoryFavorites;
use repovibe_api::github::GithubClient;
use repovibe_api::orchestrator::IssueAnalyzer;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let analyzer = IssueAnalyzer::from_config(&config.providers)
        .context("Failed to create model client")?;
    let github = GithubClient::new(&config.github).context("Failed to create GitHub client")?;

    if !analyzer.is_configured() {
        warn!("No model API key configured, AI suggestions will use the static fallback");
    }
    if !github.has_token() {
        warn!("GITHUB_TOKEN not set, GitHub endpoints will fail");
    }

    let state = web::Data::new(AppState {
        analyzer,
        github,
        favorites: Arc::new(InMemoryFavorites::new()),
    });

    let (host, port) = (config.server.host.clone(), config.server.port);
    info!("Starting RepoVibe API server at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await?;

    Ok(())
}
