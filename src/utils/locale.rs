use serde::{Deserialize, Serialize};

/// Languages the marketplace is offered in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "app_locale", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
    De,
}

impl Locale {
    pub fn to_str(&self) -> &str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Ar => "ar",
            Locale::De => "de",
        }
    }

    /// Accepts bare codes and region-tagged ones (`fr-MA`, `de_DE`).
    /// Anything unsupported resolves to English.
    pub fn parse(value: &str) -> Locale {
        Locale::try_parse(value).unwrap_or_default()
    }

    pub fn try_parse(value: &str) -> Option<Locale> {
        let primary = value
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_lowercase();

        match primary.as_str() {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            "ar" => Some(Locale::Ar),
            "de" => Some(Locale::De),
            _ => None,
        }
    }

    /// Picks the supported language with the highest q-value from an
    /// `Accept-Language` header. Ties keep header order.
    pub fn from_accept_language(header: &str) -> Locale {
        let mut best: Option<(Locale, f32)> = None;

        for part in header.split(',') {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next().unwrap_or("");
            let quality = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            if let Some(locale) = Locale::try_parse(tag) {
                match best {
                    Some((_, best_q)) if best_q >= quality => {}
                    _ => best = Some((locale, quality)),
                }
            }
        }

        best.map(|(locale, _)| locale).unwrap_or_default()
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Locale::Ar)
    }

    pub fn dir(&self) -> &str {
        if self.is_rtl() { "rtl" } else { "ltr" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_tags() {
        assert_eq!(Locale::parse("fr-FR"), Locale::Fr);
        assert_eq!(Locale::parse("de_AT"), Locale::De);
        assert_eq!(Locale::parse("AR"), Locale::Ar);
        assert_eq!(Locale::parse("es-ES"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }

    #[test]
    fn accept_language_respects_quality() {
        assert_eq!(Locale::from_accept_language("es;q=1.0, de;q=0.4, fr;q=0.8"), Locale::Fr);
        assert_eq!(Locale::from_accept_language("ar-MA,fr;q=0.9"), Locale::Ar);
        assert_eq!(Locale::from_accept_language("ja, zh;q=0.5"), Locale::En);
        assert_eq!(Locale::from_accept_language("fr, de"), Locale::Fr);
    }

    #[test]
    fn only_arabic_is_rtl() {
        assert!(Locale::Ar.is_rtl());
        assert_eq!(Locale::Ar.dir(), "rtl");
        assert!(!Locale::Fr.is_rtl());
    }
}
