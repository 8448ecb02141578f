//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the live chat sessions, the knowledge store, the provider
//! boundary and the contact relay. Sessions are in memory only and are
//! dropped by the sweeper once idle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::conversation::Conversation;
use crate::i18n::{Catalog, CatalogError};
use crate::llm::types::Sampling;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::services::assistant::Assistant;
use crate::services::contact::ContactRelay;
use crate::services::knowledge::KnowledgeStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Live conversations keyed by session ID.
    pub sessions: Arc<RwLock<HashMap<Uuid, Conversation>>>,
    pub knowledge: KnowledgeStore,
    pub assistant: Assistant,
    /// Sampling parameters sent with every request.
    pub sampling: Sampling,
    pub catalog: Arc<Catalog>,
    /// In-memory rate limiter for chat requests.
    pub rate_limiter: RateLimiter,
    pub contact: ContactRelay,
}

impl AppState {
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the built-in string catalog is incomplete.
    pub fn new(
        config: AppConfig,
        knowledge: KnowledgeStore,
        assistant: Assistant,
        sampling: Sampling,
        rate_limit: RateLimitConfig,
        contact: ContactRelay,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            knowledge,
            assistant,
            sampling,
            catalog: Arc::new(Catalog::new()?),
            rate_limiter: RateLimiter::new(rate_limit),
            contact,
        })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
