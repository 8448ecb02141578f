//! Contact form — validation and best-effort relay submission.
//!
//! DESIGN
//! ======
//! The form is posted as JSON to an external mail relay that answers
//! `{ "status": "success" | other, "message"? }`. A non-success status, a
//! transport failure and a malformed answer are the same outcome to the
//! guest: an error banner with their input handed back untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::i18n::{Catalog, Locale, TextKey};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("contact relay URL not configured")]
    RelayNotConfigured,
    #[error("relay request failed: {0}")]
    Transport(String),
    #[error("relay rejected submission: {status}")]
    Rejected { status: String, message: Option<String> },
    #[error("relay response malformed: {0}")]
    Malformed(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for ContactError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RelayNotConfigured => "E_CONTACT_NOT_CONFIGURED",
            Self::Transport(_) => "E_CONTACT_TRANSPORT",
            Self::Rejected { .. } => "E_CONTACT_REJECTED",
            Self::Malformed(_) => "E_CONTACT_MALFORMED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        !matches!(self, Self::RelayNotConfigured | Self::HttpClientBuild(_))
    }
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Success,
    Error,
}

/// What the contact view renders after a submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactOutcome {
    pub status: ContactStatus,
    pub title: &'static str,
    pub detail: Option<&'static str>,
    /// The submitted values, present on failure so the form stays populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<ContactForm>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Trim the form and check required fields and email shape.
///
/// # Errors
///
/// Returns every failing field with its localized message.
pub fn validate(form: &ContactForm, catalog: &Catalog, locale: Locale) -> Result<ContactForm, Vec<FieldError>> {
    let cleaned = ContactForm {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        phone: form
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned),
        message: form.message.trim().to_owned(),
    };
    let required = catalog.text(locale, TextKey::ContactRequired);
    let mut errors = Vec::new();
    if cleaned.name.is_empty() {
        errors.push(FieldError { field: "name", message: required });
    }
    if cleaned.email.is_empty() {
        errors.push(FieldError { field: "email", message: required });
    } else if !is_plausible_email(&cleaned.email) {
        errors.push(FieldError { field: "email", message: catalog.text(locale, TextKey::ContactInvalidEmail) });
    }
    if cleaned.message.is_empty() {
        errors.push(FieldError { field: "message", message: required });
    }
    if errors.is_empty() { Ok(cleaned) } else { Err(errors) }
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// =============================================================================
// RELAY
// =============================================================================

#[derive(Clone)]
pub struct ContactRelay {
    http: reqwest::Client,
    url: Option<String>,
}

impl ContactRelay {
    /// # Errors
    ///
    /// Returns [`ContactError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, ContactError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContactError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url })
    }

    /// Post `form` to the relay.
    ///
    /// # Errors
    ///
    /// Any [`ContactError`]; all mean "not delivered".
    pub async fn send(&self, form: &ContactForm) -> Result<(), ContactError> {
        let url = self.url.as_deref().ok_or(ContactError::RelayNotConfigured)?;
        let response = self
            .http
            .post(url)
            .json(form)
            .send()
            .await
            .map_err(|e| ContactError::Transport(e.to_string()))?;
        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ContactError::Transport(e.to_string()))?;
        let parsed: RelayResponse = serde_json::from_str(&body)
            .map_err(|e| ContactError::Malformed(format!("HTTP {http_status}: {e}")))?;
        if parsed.status != "success" {
            return Err(ContactError::Rejected { status: parsed.status, message: parsed.message });
        }
        Ok(())
    }
}

/// Validate and relay a submission, producing the localized outcome.
pub async fn submit(relay: &ContactRelay, catalog: &Catalog, locale: Locale, form: ContactForm) -> ContactOutcome {
    let failed = |form: ContactForm, field_errors: Vec<FieldError>| ContactOutcome {
        status: ContactStatus::Error,
        title: catalog.text(locale, TextKey::ContactError),
        detail: None,
        form: Some(form),
        field_errors,
    };

    let cleaned = match validate(&form, catalog, locale) {
        Ok(cleaned) => cleaned,
        Err(errors) => return failed(form, errors),
    };

    match relay.send(&cleaned).await {
        Ok(()) => {
            info!(%locale, "contact: submission relayed");
            ContactOutcome {
                status: ContactStatus::Success,
                title: catalog.text(locale, TextKey::ContactSuccess),
                detail: Some(catalog.text(locale, TextKey::ContactSuccessSub)),
                form: None,
                field_errors: Vec::new(),
            }
        }
        Err(e) => {
            warn!(error = %e, code = crate::error::ErrorCode::error_code(&e), "contact: submission failed");
            failed(form, Vec::new())
        }
    }
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
