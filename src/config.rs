//! Service configuration parsed from environment variables.

use std::time::Duration;

use crate::llm::config::env_parse;
use crate::services::knowledge::DEFAULT_NAMESPACE;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;
const DEFAULT_CONTACT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BOOKING_URL: &str = "https://booking.redforts.com/e4mh/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres for the knowledge store; in-memory storage when absent.
    pub database_url: Option<String>,
    /// Mail relay endpoint for the contact form; submissions fail when absent.
    pub contact_relay_url: Option<String>,
    pub contact_timeout: Duration,
    pub booking_url: String,
    /// Idle time after which a chat session is dropped.
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub knowledge_namespace: String,
    pub seed_knowledge: bool,
}

impl AppConfig {
    /// Read `PORT`, `DATABASE_URL`, `CONTACT_RELAY_URL`,
    /// `CONTACT_TIMEOUT_SECS`, `BOOKING_URL`, `CHAT_SESSION_TTL_SECS`,
    /// `CHAT_SESSION_SWEEP_SECS`, `KNOWLEDGE_NAMESPACE` and
    /// `KNOWLEDGE_SEED_DEFAULTS`. Malformed numbers fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: non_empty_var("DATABASE_URL"),
            contact_relay_url: non_empty_var("CONTACT_RELAY_URL"),
            contact_timeout: Duration::from_secs(env_parse("CONTACT_TIMEOUT_SECS", DEFAULT_CONTACT_TIMEOUT_SECS)),
            booking_url: non_empty_var("BOOKING_URL").unwrap_or_else(|| DEFAULT_BOOKING_URL.to_owned()),
            session_ttl: Duration::from_secs(env_parse("CHAT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)),
            session_sweep_interval: Duration::from_secs(
                env_parse("CHAT_SESSION_SWEEP_SECS", DEFAULT_SESSION_SWEEP_SECS).max(1),
            ),
            knowledge_namespace: non_empty_var("KNOWLEDGE_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned()),
            seed_knowledge: env_parse("KNOWLEDGE_SEED_DEFAULTS", true),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            contact_relay_url: None,
            contact_timeout: Duration::from_secs(DEFAULT_CONTACT_TIMEOUT_SECS),
            booking_url: DEFAULT_BOOKING_URL.to_owned(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            session_sweep_interval: Duration::from_secs(DEFAULT_SESSION_SWEEP_SECS),
            knowledge_namespace: DEFAULT_NAMESPACE.to_owned(),
            seed_knowledge: true,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
