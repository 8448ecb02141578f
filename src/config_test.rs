use super::*;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const KEYS: [&str; 9] = [
    "PORT",
    "DATABASE_URL",
    "CONTACT_RELAY_URL",
    "CONTACT_TIMEOUT_SECS",
    "BOOKING_URL",
    "CHAT_SESSION_TTL_SECS",
    "CHAT_SESSION_SWEEP_SECS",
    "KNOWLEDGE_NAMESPACE",
    "KNOWLEDGE_SEED_DEFAULTS",
];

/// # Safety
/// Callers hold `ENV_LOCK` so no other test mutates the environment concurrently.
unsafe fn clear_app_env() {
    unsafe {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn from_env_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_app_env() };

    assert_eq!(AppConfig::from_env(), AppConfig::default());
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_app_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("CONTACT_RELAY_URL", "https://relay.example/send");
        std::env::set_var("CHAT_SESSION_TTL_SECS", "120");
        std::env::set_var("KNOWLEDGE_NAMESPACE", "hostal_knowledge_v2");
        std::env::set_var("KNOWLEDGE_SEED_DEFAULTS", "false");
    }

    let cfg = AppConfig::from_env();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.contact_relay_url.as_deref(), Some("https://relay.example/send"));
    assert_eq!(cfg.session_ttl, Duration::from_secs(120));
    assert_eq!(cfg.knowledge_namespace, "hostal_knowledge_v2");
    assert!(!cfg.seed_knowledge);
    assert!(cfg.database_url.is_none());

    unsafe { clear_app_env() };
}

#[test]
fn blank_and_malformed_values_fall_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_app_env();
        std::env::set_var("DATABASE_URL", "  ");
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("CHAT_SESSION_SWEEP_SECS", "0");
    }

    let cfg = AppConfig::from_env();
    assert!(cfg.database_url.is_none());
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.session_sweep_interval, Duration::from_secs(1));

    unsafe { clear_app_env() };
}
