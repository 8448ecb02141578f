//! Knowledge store — operator-maintained grounding snippets.
//!
//! DESIGN
//! ======
//! The whole ordered snippet list lives under one namespace key in an
//! injected [`KnowledgeBackend`]: `MemoryBackend` for tests and DB-less
//! runs, `PgBackend` for a Postgres key/value row. The store keeps a
//! cached copy so request builds never touch storage.
//!
//! ERROR HANDLING
//! ==============
//! Mutations are applied to a copy, written to the backend, and only then
//! committed to the cache. A failed write leaves the visible list
//! unchanged. Writers are serialized by the cache lock; last writer wins.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_NAMESPACE: &str = "hostal_knowledge_v1";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub id: Uuid,
    pub title: String,
    pub content: String,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnippetPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("content must not be empty")]
    EmptyContent,
    #[error("snippet not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored knowledge is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for KnowledgeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "E_EMPTY_TITLE",
            Self::EmptyContent => "E_EMPTY_CONTENT",
            Self::NotFound(_) => "E_SNIPPET_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
            Self::Malformed(_) => "E_MALFORMED_KNOWLEDGE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// =============================================================================
// BACKENDS
// =============================================================================

/// Storage for the snippet list under a namespace key.
#[async_trait::async_trait]
pub trait KnowledgeBackend: Send + Sync {
    /// Load the list stored under `namespace`, `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns a [`KnowledgeError`] if storage is unreachable or the stored
    /// value cannot be decoded.
    async fn load(&self, namespace: &str) -> Result<Option<Vec<KnowledgeSnippet>>, KnowledgeError>;

    /// Replace the list stored under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns a [`KnowledgeError`] if the write fails.
    async fn save(&self, namespace: &str, snippets: &[KnowledgeSnippet]) -> Result<(), KnowledgeError>;
}

/// In-process backend.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<KnowledgeSnippet>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KnowledgeBackend for MemoryBackend {
    async fn load(&self, namespace: &str) -> Result<Option<Vec<KnowledgeSnippet>>, KnowledgeError> {
        Ok(self.entries.lock().await.get(namespace).cloned())
    }

    async fn save(&self, namespace: &str, snippets: &[KnowledgeSnippet]) -> Result<(), KnowledgeError> {
        self.entries
            .lock()
            .await
            .insert(namespace.to_owned(), snippets.to_vec());
        Ok(())
    }
}

/// Postgres backend over the `knowledge_store` key/value table.
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl KnowledgeBackend for PgBackend {
    async fn load(&self, namespace: &str) -> Result<Option<Vec<KnowledgeSnippet>>, KnowledgeError> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>("SELECT value FROM knowledge_store WHERE namespace = $1")
            .bind(namespace)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(value,)| serde_json::from_value(value).map_err(KnowledgeError::from))
            .transpose()
    }

    async fn save(&self, namespace: &str, snippets: &[KnowledgeSnippet]) -> Result<(), KnowledgeError> {
        let value = serde_json::to_value(snippets)?;
        sqlx::query(
            "INSERT INTO knowledge_store (namespace, value, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (namespace) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(namespace)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct KnowledgeStore {
    backend: Arc<dyn KnowledgeBackend>,
    namespace: String,
    snippets: Arc<RwLock<Vec<KnowledgeSnippet>>>,
}

impl KnowledgeStore {
    /// Open the store, hydrating the cache from `backend`. An empty
    /// namespace is seeded with [`default_snippets`] when `seed_defaults`.
    ///
    /// # Errors
    ///
    /// Returns a [`KnowledgeError`] if the backend cannot be read or seeded.
    pub async fn open(
        backend: Arc<dyn KnowledgeBackend>,
        namespace: impl Into<String>,
        seed_defaults: bool,
    ) -> Result<Self, KnowledgeError> {
        let namespace = namespace.into();
        let snippets = match backend.load(&namespace).await? {
            Some(stored) => stored,
            None if seed_defaults => {
                let defaults = default_snippets();
                backend.save(&namespace, &defaults).await?;
                info!(%namespace, count = defaults.len(), "knowledge: seeded defaults");
                defaults
            }
            None => Vec::new(),
        };
        info!(%namespace, count = snippets.len(), "knowledge: loaded");
        Ok(Self { backend, namespace, snippets: Arc::new(RwLock::new(snippets)) })
    }

    /// Snippets in insertion order.
    pub async fn list(&self) -> Vec<KnowledgeSnippet> {
        self.snippets.read().await.clone()
    }

    /// Append a snippet.
    ///
    /// # Errors
    ///
    /// Rejects blank title or content; propagates backend write failures.
    pub async fn add(&self, title: &str, content: &str) -> Result<KnowledgeSnippet, KnowledgeError> {
        let snippet = KnowledgeSnippet {
            id: Uuid::new_v4(),
            title: non_blank(title, KnowledgeError::EmptyTitle)?,
            content: non_blank(content, KnowledgeError::EmptyContent)?,
        };
        let mut guard = self.snippets.write().await;
        let mut next = guard.clone();
        next.push(snippet.clone());
        self.backend.save(&self.namespace, &next).await?;
        *guard = next;
        info!(id = %snippet.id, title = %snippet.title, "knowledge: snippet added");
        Ok(snippet)
    }

    /// Apply `patch` to the snippet with `id`, keeping its position.
    ///
    /// # Errors
    ///
    /// Rejects blank supplied fields and unknown ids; propagates backend
    /// write failures.
    pub async fn update(&self, id: Uuid, patch: SnippetPatch) -> Result<KnowledgeSnippet, KnowledgeError> {
        let title = patch
            .title
            .as_deref()
            .map(|t| non_blank(t, KnowledgeError::EmptyTitle))
            .transpose()?;
        let content = patch
            .content
            .as_deref()
            .map(|c| non_blank(c, KnowledgeError::EmptyContent))
            .transpose()?;

        let mut guard = self.snippets.write().await;
        let mut next = guard.clone();
        let snippet = next
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(KnowledgeError::NotFound(id))?;
        if let Some(title) = title {
            snippet.title = title;
        }
        if let Some(content) = content {
            snippet.content = content;
        }
        let updated = snippet.clone();
        self.backend.save(&self.namespace, &next).await?;
        *guard = next;
        info!(%id, "knowledge: snippet updated");
        Ok(updated)
    }

    /// Remove the snippet with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::NotFound`] for unknown ids; propagates
    /// backend write failures.
    pub async fn remove(&self, id: Uuid) -> Result<(), KnowledgeError> {
        let mut guard = self.snippets.write().await;
        let mut next = guard.clone();
        let before = next.len();
        next.retain(|s| s.id != id);
        if next.len() == before {
            return Err(KnowledgeError::NotFound(id));
        }
        self.backend.save(&self.namespace, &next).await?;
        *guard = next;
        info!(%id, "knowledge: snippet removed");
        Ok(())
    }
}

fn non_blank(value: &str, err: KnowledgeError) -> Result<String, KnowledgeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() { Err(err) } else { Ok(trimmed.to_owned()) }
}

/// The hostel's starter knowledge.
#[must_use]
pub fn default_snippets() -> Vec<KnowledgeSnippet> {
    const DEFAULTS: &[(&str, &str)] = &[
        (
            "Check-in",
            "Desde las 15:00h (3:00 PM). Recepción abierta 24h. Si llegas antes puedes dejar equipaje en consigna.",
        ),
        (
            "Check-out",
            "Límite a las 11:00h AM. Se puede dejar equipaje en consigna después. No hay late check-out.",
        ),
        (
            "Pagos y Tarifas",
            "No Reembolsable: se cobra al reservar. Solo Acomodación: depósito de una noche 3 días antes, el resto al llegar (tarjeta o efectivo). Tasa turística se paga al llegar.",
        ),
        (
            "Cómo llegar",
            "Desde Aeropuerto: Aerobús a Plaza Catalunya, luego Metro L3 a Liceu. Desde Sants: Metro L3 (línea verde) a Liceu. También Taxi/Uber disponible.",
        ),
        (
            "Accesibilidad",
            "No adaptado para necesidades especiales. Acceso por escaleras, ascensor pequeño (no cabe silla de ruedas sin plegar).",
        ),
        (
            "Servicios Habitación",
            "Sin televisión. Incluye ropa de cama y toallas. Wifi gratis. Aire acondicionado y calefacción.",
        ),
        (
            "Otros Servicios",
            "Pequeña nevera en recepción para medicinas. No hay cocina ni microondas. No hay desayuno ni comidas.",
        ),
        (
            "Ubicación y Entorno",
            "En el centro gótico, Baixada de Sant Miquel 2. Cerca de Las Ramblas, Liceu y la Catedral.",
        ),
    ];
    DEFAULTS
        .iter()
        .map(|(title, content)| KnowledgeSnippet {
            id: Uuid::new_v4(),
            title: (*title).to_owned(),
            content: (*content).to_owned(),
        })
        .collect()
}

#[cfg(test)]
#[path = "knowledge_test.rs"]
mod tests;
