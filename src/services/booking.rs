//! Booking placeholder. Reservations are taken by the external engine at
//! `BOOKING_URL`; nothing is processed here.

use serde::Serialize;

use crate::i18n::{Catalog, Locale, TextKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingPlaceholder {
    pub locale: Locale,
    pub title: &'static str,
    pub body: &'static str,
    pub notice: &'static str,
    pub book_label: &'static str,
    pub booking_url: String,
}

#[must_use]
pub fn placeholder(catalog: &Catalog, locale: Locale, booking_url: &str) -> BookingPlaceholder {
    BookingPlaceholder {
        locale,
        title: catalog.text(locale, TextKey::BookingTitle),
        body: catalog.text(locale, TextKey::BookingBody),
        notice: catalog.text(locale, TextKey::BookingSoon),
        book_label: catalog.text(locale, TextKey::BookNow),
        booking_url: booking_url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_localized_with_fallback() {
        let catalog = Catalog::new().unwrap();
        let en = placeholder(&catalog, Locale::En, "https://book.example/");
        assert_eq!(en.notice, "Coming soon");
        assert_eq!(en.booking_url, "https://book.example/");

        // No German booking texts: base locale is used.
        let de = placeholder(&catalog, Locale::De, "https://book.example/");
        assert_eq!(de.title, "Sistema de Reservas");
    }
}
