mod config;
mod db;
mod llm;
mod models;
mod routes;
mod services;
mod state;
mod store;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::AppConfig::from_env().expect("invalid server configuration");

    // LLM providers are optional: every agent step has a static fallback.
    let llm = match llm::config::LlmConfig::from_env().and_then(llm::LlmService::from_config) {
        Ok(service) => {
            let providers = service.providers();
            if providers.is_empty() {
                tracing::warn!("no LLM provider configured; tutor will answer with fallback questions");
            } else {
                tracing::info!(?providers, "LLM providers ready");
            }
            service
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM configuration invalid; AI features disabled");
            llm::LlmService::disabled()
        }
    };

    let mirror = services::mirror::DocumentMirror::connect(&config).await;
    let state = state::AppState::new(llm, mirror, &config.environment);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("failed to bind");

    tracing::info!(addr = %config.bind, environment = %config.environment, "tutor listening");
    axum::serve(listener, app).await.expect("server failed");
}
