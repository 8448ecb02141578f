mod config;
mod conversation;
mod db;
mod error;
mod i18n;
mod llm;
mod rate_limit;
mod render;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::config::LlmConfig;
use crate::llm::retry::RetryPolicy;
use crate::llm::types::Sampling;
use crate::llm::{LlmChat, LlmClient};
use crate::rate_limit::RateLimitConfig;
use crate::services::assistant::Assistant;
use crate::services::contact::ContactRelay;
use crate::services::knowledge::{KnowledgeBackend, KnowledgeStore, MemoryBackend, PgBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    // A missing or broken LLM config still serves; every send then fails
    // as a configuration failure.
    let (llm, sampling, policy) = match LlmConfig::from_env() {
        Ok(llm_config) => {
            let sampling = llm_config.sampling;
            let policy = RetryPolicy::from(llm_config.retry);
            match LlmClient::from_config(llm_config) {
                Ok(client) => {
                    tracing::info!(model = client.model(), "llm client configured");
                    (Some(Arc::new(client) as Arc<dyn LlmChat>), sampling, policy)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "llm client unavailable");
                    (None, sampling, policy)
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "llm config unavailable");
            (None, Sampling::default(), RetryPolicy::default())
        }
    };

    let backend: Arc<dyn KnowledgeBackend> = match &config.database_url {
        Some(url) => Arc::new(PgBackend::new(db::init_pool(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set; knowledge is kept in memory");
            Arc::new(MemoryBackend::new())
        }
    };
    let knowledge = KnowledgeStore::open(backend, config.knowledge_namespace.clone(), config.seed_knowledge).await?;
    let contact = ContactRelay::new(config.contact_relay_url.clone(), config.contact_timeout)?;

    let port = config.port;
    let state = state::AppState::new(
        config,
        knowledge,
        Assistant::new(llm, policy),
        sampling,
        RateLimitConfig::from_env(),
        contact,
    )?;

    let _sweeper = services::chat::spawn_session_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "concierge listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
