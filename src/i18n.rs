//! Locale resolution and the UI string catalog.
//!
//! DESIGN
//! ======
//! `Locale` is a closed set. Resolution walks explicit `lang` parameter →
//! referring page URL → `Accept-Language` → [`Locale::BASE`], so it always
//! lands on a supported tag.
//!
//! The catalog is total: a lookup falls back to the base locale, and
//! `Catalog::new` refuses to build if the base table is missing any key.
//! Non-base tables may be partial.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

// =============================================================================
// LOCALE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
    Ca,
    De,
    It,
    Fr,
    Nl,
    Pt,
}

impl Locale {
    pub const BASE: Locale = Locale::Es;
    pub const ALL: [Locale; 8] =
        [Locale::Es, Locale::En, Locale::Ca, Locale::De, Locale::It, Locale::Fr, Locale::Nl, Locale::Pt];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Ca => "ca",
            Self::De => "de",
            Self::It => "it",
            Self::Fr => "fr",
            Self::Nl => "nl",
            Self::Pt => "pt",
        }
    }

    /// Parse a language tag, ignoring case and any region subtag (`en-GB`).
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.as_str() == primary)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the locale from, in priority order, an explicit parameter, the
/// referring page, and the client's `Accept-Language` header.
#[must_use]
pub fn resolve_locale(explicit: Option<&str>, referrer: Option<&str>, accept_language: Option<&str>) -> Locale {
    explicit
        .and_then(Locale::parse)
        .or_else(|| referrer.and_then(locale_from_referrer))
        .or_else(|| accept_language.and_then(locale_from_accept_language))
        .unwrap_or(Locale::BASE)
}

/// Match a `lang=` query pair or a path segment such as `/en/rooms`.
fn locale_from_referrer(referrer: &str) -> Option<Locale> {
    let url = Url::parse(referrer).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "lang")
        .and_then(|(_, v)| Locale::parse(&v))
        .or_else(|| {
            url.path_segments()?
                .filter(|seg| seg.len() == 2)
                .find_map(Locale::parse)
        })
}

/// First supported tag by descending `q` weight; ties keep header order.
fn locale_from_accept_language(header: &str) -> Option<Locale> {
    let mut ranked: Vec<(f32, Locale)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let locale = Locale::parse(parts.next()?)?;
            let q = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then_some((q, locale))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.first().map(|(_, l)| *l)
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    Greeting,
    TipDirections,
    TipCheckIn,
    TipWifi,
    TipNearby,
    BookNow,
    InputPlaceholder,
    ErrorConnection,
    ErrorConfiguration,
    ErrorEmptyReply,
    ErrorRateLimited,
    ContactTitle,
    ContactSubtitle,
    ContactSuccess,
    ContactSuccessSub,
    ContactError,
    ContactRequired,
    ContactInvalidEmail,
    BookingTitle,
    BookingBody,
    BookingSoon,
}

impl TextKey {
    pub const ALL: [TextKey; 21] = [
        TextKey::Greeting,
        TextKey::TipDirections,
        TextKey::TipCheckIn,
        TextKey::TipWifi,
        TextKey::TipNearby,
        TextKey::BookNow,
        TextKey::InputPlaceholder,
        TextKey::ErrorConnection,
        TextKey::ErrorConfiguration,
        TextKey::ErrorEmptyReply,
        TextKey::ErrorRateLimited,
        TextKey::ContactTitle,
        TextKey::ContactSubtitle,
        TextKey::ContactSuccess,
        TextKey::ContactSuccessSub,
        TextKey::ContactError,
        TextKey::ContactRequired,
        TextKey::ContactInvalidEmail,
        TextKey::BookingTitle,
        TextKey::BookingBody,
        TextKey::BookingSoon,
    ];

    /// Suggestion chips shown under the greeting, in display order.
    pub const QUICK_TIPS: [TextKey; 4] =
        [TextKey::TipDirections, TextKey::TipCheckIn, TextKey::TipWifi, TextKey::TipNearby];
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("base locale {locale} is missing text for {key:?}")]
    IncompleteBase { locale: Locale, key: TextKey },
}

type Table = &'static [(TextKey, &'static str)];

pub struct Catalog {
    tables: HashMap<Locale, HashMap<TextKey, &'static str>>,
}

impl Catalog {
    /// Build the catalog from the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::IncompleteBase`] if the base table lacks a key.
    pub fn new() -> Result<Self, CatalogError> {
        Self::from_tables(BUILTIN_TABLES)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::IncompleteBase`] if the base table lacks a key.
    pub fn from_tables(tables: &[(Locale, Table)]) -> Result<Self, CatalogError> {
        let tables: HashMap<Locale, HashMap<TextKey, &'static str>> = tables
            .iter()
            .map(|(locale, rows)| (*locale, rows.iter().copied().collect()))
            .collect();
        let base = tables.get(&Locale::BASE);
        for key in TextKey::ALL {
            if !base.is_some_and(|t| t.contains_key(&key)) {
                return Err(CatalogError::IncompleteBase { locale: Locale::BASE, key });
            }
        }
        Ok(Self { tables })
    }

    /// Look up `key` for `locale`, falling back to the base locale.
    #[must_use]
    pub fn text(&self, locale: Locale, key: TextKey) -> &'static str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(Locale::BASE, key))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn quick_tips(&self, locale: Locale) -> Vec<&'static str> {
        TextKey::QUICK_TIPS
            .iter()
            .map(|key| self.text(locale, *key))
            .collect()
    }

    fn lookup(&self, locale: Locale, key: TextKey) -> Option<&'static str> {
        self.tables.get(&locale)?.get(&key).copied()
    }
}

// =============================================================================
// BUILT-IN TABLES
// =============================================================================

const ES: Table = &[
    (TextKey::Greeting, "¡Hola! Soy el asistente del Hostal Levante. ¿En qué puedo ayudarte hoy?"),
    (TextKey::TipDirections, "¿Cómo llegar?"),
    (TextKey::TipCheckIn, "Horario Check-in"),
    (TextKey::TipWifi, "¿Hay Wifi?"),
    (TextKey::TipNearby, "Lugares cercanos"),
    (TextKey::BookNow, "Reservar ahora"),
    (TextKey::InputPlaceholder, "Escribe..."),
    (TextKey::ErrorConnection, "Error de conexión. Inténtalo de nuevo."),
    (TextKey::ErrorConfiguration, "El asistente no está disponible en este momento. Usa el formulario de contacto."),
    (TextKey::ErrorEmptyReply, "No he podido generar una respuesta. Inténtalo de nuevo."),
    (TextKey::ErrorRateLimited, "Hay mucha demanda ahora mismo. Espera un momento e inténtalo de nuevo."),
    (TextKey::ContactTitle, "Contacto"),
    (TextKey::ContactSubtitle, "Estamos aquí para ayudarte. Envíanos tu consulta."),
    (TextKey::ContactSuccess, "¡Mensaje enviado con éxito!"),
    (TextKey::ContactSuccessSub, "Te responderemos a la brevedad en tu correo electrónico."),
    (TextKey::ContactError, "Hubo un error al enviar. Por favor, inténtalo de nuevo."),
    (TextKey::ContactRequired, "Este campo es obligatorio"),
    (TextKey::ContactInvalidEmail, "Email no válido"),
    (TextKey::BookingTitle, "Sistema de Reservas"),
    (TextKey::BookingBody, "Estamos preparando el nuevo motor de reservas inteligente para el Hostal Levante."),
    (TextKey::BookingSoon, "Disponible próximamente"),
];

const EN: Table = &[
    (TextKey::Greeting, "Hi! I'm the Hostal Levante assistant. How can I help you today?"),
    (TextKey::TipDirections, "How to get here?"),
    (TextKey::TipCheckIn, "Check-in time"),
    (TextKey::TipWifi, "Is there Wifi?"),
    (TextKey::TipNearby, "Nearby places"),
    (TextKey::BookNow, "Book now"),
    (TextKey::InputPlaceholder, "Write..."),
    (TextKey::ErrorConnection, "Connection error. Please try again."),
    (TextKey::ErrorConfiguration, "The assistant is unavailable right now. Please use the contact form."),
    (TextKey::ErrorEmptyReply, "I couldn't come up with an answer. Please try again."),
    (TextKey::ErrorRateLimited, "We're very busy right now. Please wait a moment and try again."),
    (TextKey::ContactTitle, "Contact Us"),
    (TextKey::ContactSubtitle, "We are here to help. Send us your inquiry."),
    (TextKey::ContactSuccess, "Message sent successfully!"),
    (TextKey::ContactSuccessSub, "We will get back to you shortly via email."),
    (TextKey::ContactError, "There was an error. Please try again."),
    (TextKey::ContactRequired, "Required field"),
    (TextKey::ContactInvalidEmail, "Invalid email"),
    (TextKey::BookingTitle, "Booking System"),
    (TextKey::BookingBody, "We are preparing the new smart booking engine for Hostal Levante."),
    (TextKey::BookingSoon, "Coming soon"),
];

const CA: Table = &[
    (TextKey::Greeting, "Hola! Soc l'assistent de l'Hostal Levante. En què et puc ajudar avui?"),
    (TextKey::TipDirections, "Com arribar-hi?"),
    (TextKey::TipCheckIn, "Horari Check-in"),
    (TextKey::TipWifi, "Hi ha Wifi?"),
    (TextKey::TipNearby, "Llocs propers"),
    (TextKey::BookNow, "Reservar ara"),
    (TextKey::InputPlaceholder, "Escriu..."),
    (TextKey::ErrorConnection, "Error de connexió. Torna-ho a provar."),
    (TextKey::ContactTitle, "Contacte"),
    (TextKey::ContactSubtitle, "Estem aquí per ajudar-te. Envia'ns la teva consulta."),
    (TextKey::ContactSuccess, "Missatge enviat amb èxit!"),
    (TextKey::ContactSuccessSub, "Et respondrem ben aviat al teu correu electrònic."),
    (TextKey::ContactError, "S'ha produït un error. Torna-ho a intentar."),
    (TextKey::ContactRequired, "Camp obligatori"),
    (TextKey::ContactInvalidEmail, "Email no vàlid"),
];

const DE: Table = &[
    (TextKey::Greeting, "Hallo! Ich bin der Assistent des Hostal Levante. Wie kann ich Ihnen heute helfen?"),
    (TextKey::TipDirections, "Anfahrt?"),
    (TextKey::TipCheckIn, "Check-in Zeit"),
    (TextKey::TipWifi, "Gibt es WLAN?"),
    (TextKey::TipNearby, "Orte in der Nähe"),
    (TextKey::ContactTitle, "Kontakt"),
    (TextKey::ContactSubtitle, "Wir sind hier, um zu helfen."),
    (TextKey::ContactSuccess, "Nachricht gesendet!"),
    (TextKey::ContactSuccessSub, "Wir werden uns in Kürze per E-Mail bei Ihnen melden."),
    (TextKey::ContactError, "Fehler beim Senden."),
    (TextKey::ContactRequired, "Erforderlich"),
    (TextKey::ContactInvalidEmail, "Ungültige E-Mail"),
];

const IT: Table = &[
    (TextKey::Greeting, "Ciao! Sono l'assistente dell'Hostal Levante. Come posso aiutarti oggi?"),
    (TextKey::TipDirections, "Come arrivare?"),
    (TextKey::TipCheckIn, "Orario Check-in"),
    (TextKey::TipWifi, "C'è il Wifi?"),
    (TextKey::TipNearby, "Luoghi vicini"),
    (TextKey::ContactTitle, "Contatto"),
    (TextKey::ContactSubtitle, "Siamo qui per aiutarti."),
    (TextKey::ContactSuccess, "Messaggio inviato!"),
    (TextKey::ContactSuccessSub, "Ti risponderemo al più presto via email."),
    (TextKey::ContactError, "Errore durante l'invio."),
    (TextKey::ContactRequired, "Obbligatorio"),
    (TextKey::ContactInvalidEmail, "Email non valida"),
];

const FR: Table = &[
    (TextKey::Greeting, "Bonjour ! Je suis l'assistant de l'Hostal Levante. Comment puis-je vous aider aujourd'hui ?"),
    (TextKey::TipDirections, "Comment venir ?"),
    (TextKey::TipCheckIn, "Heure d'arrivée"),
    (TextKey::TipWifi, "Y a-t-il du Wifi ?"),
    (TextKey::TipNearby, "Lieux proches"),
    (TextKey::ContactTitle, "Contact"),
    (TextKey::ContactSubtitle, "Nous sommes là pour vous aider."),
    (TextKey::ContactSuccess, "Message envoyé !"),
    (TextKey::ContactSuccessSub, "Nous vous répondrons par email dès que possible."),
    (TextKey::ContactError, "Erreur lors de l'envoi."),
    (TextKey::ContactRequired, "Obligatoire"),
    (TextKey::ContactInvalidEmail, "Email invalide"),
];

const NL: Table = &[
    (TextKey::Greeting, "Hallo! Ik ben de assistent van Hostal Levante. Hoe kan ik u vandaag helpen?"),
    (TextKey::TipDirections, "Hoe kom ik er?"),
    (TextKey::TipCheckIn, "Check-in tijd"),
    (TextKey::TipWifi, "Is er Wifi?"),
    (TextKey::TipNearby, "Plaatsen in de buurt"),
    (TextKey::ContactTitle, "Contact"),
    (TextKey::ContactSubtitle, "Wij zijn hier om te helpen."),
    (TextKey::ContactSuccess, "Bericht verzonden!"),
    (TextKey::ContactSuccessSub, "We nemen zo snel mogelijk contact met u op via e-mail."),
    (TextKey::ContactError, "Fout bij verzenden."),
    (TextKey::ContactRequired, "Verplicht"),
    (TextKey::ContactInvalidEmail, "Ongeldig e-mailadres"),
];

const PT: Table = &[
    (TextKey::Greeting, "Olá! Sou o assistente do Hostal Levante. Como posso ajudá-lo hoje?"),
    (TextKey::TipDirections, "Como chegar?"),
    (TextKey::TipCheckIn, "Horário de Check-in"),
    (TextKey::TipWifi, "Tem Wifi?"),
    (TextKey::TipNearby, "Lugares próximos"),
    (TextKey::ContactTitle, "Contato"),
    (TextKey::ContactSubtitle, "Estamos aqui para ajudar."),
    (TextKey::ContactSuccess, "Mensagem enviada!"),
    (TextKey::ContactSuccessSub, "Responderemos o mais breve possível por e-mail."),
    (TextKey::ContactError, "Erro ao enviar."),
    (TextKey::ContactRequired, "Obrigatório"),
    (TextKey::ContactInvalidEmail, "E-mail inválido"),
];

const BUILTIN_TABLES: &[(Locale, Table)] = &[
    (Locale::Es, ES),
    (Locale::En, EN),
    (Locale::Ca, CA),
    (Locale::De, DE),
    (Locale::It, IT),
    (Locale::Fr, FR),
    (Locale::Nl, NL),
    (Locale::Pt, PT),
];

#[cfg(test)]
#[path = "i18n_test.rs"]
mod tests;
