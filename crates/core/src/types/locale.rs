//! Display language and color theme.

use serde::{Deserialize, Serialize};

/// Cookie holding the resolved locale.
pub const LOCALE_COOKIE: &str = "locale";

/// Cookie holding the client's theme choice.
pub const THEME_COOKIE: &str = "theme";

/// Request header carrying the resolved locale to downstream handlers.
pub const LOCALE_HEADER: &str = "x-locale";

/// Lifetime of the locale and theme cookies, in seconds (one year).
pub const PREFERENCE_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

/// The active display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Arabic, right-to-left. The default.
    #[default]
    Ar,
    /// English.
    En,
}

impl Locale {
    /// Locale used when nothing else decides.
    pub const DEFAULT: Self = Self::Ar;

    /// Parse an exact `"ar"` / `"en"` value. Anything else is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ar" => Some(Self::Ar),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Resolve the effective locale for a request.
    ///
    /// Precedence: explicit `lang` query value, then the locale cookie, then
    /// an `Accept-Language` header containing `en` (case-insensitive), then
    /// Arabic. Invalid values at any step fall through silently.
    #[must_use]
    pub fn resolve(
        query_lang: Option<&str>,
        cookie: Option<&str>,
        accept_language: Option<&str>,
    ) -> Self {
        if let Some(locale) = query_lang.and_then(Self::parse) {
            return locale;
        }
        if let Some(locale) = cookie.and_then(Self::parse) {
            return locale;
        }
        match accept_language {
            Some(header) if header.to_ascii_lowercase().contains("en") => Self::En,
            _ => Self::DEFAULT,
        }
    }

    /// Two-letter code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    /// Text direction for the `dir` attribute.
    #[must_use]
    pub const fn direction(self) -> &'static str {
        match self {
            Self::Ar => "rtl",
            Self::En => "ltr",
        }
    }

    /// Public brand name in this locale.
    #[must_use]
    pub const fn brand(self) -> &'static str {
        match self {
            Self::Ar => "\u{0647}\u{0627}\u{0631}\u{062a}\u{0686}",
            Self::En => "Hrtaj",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color theme. Resolved client-side; the server only reads the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark theme. The default.
    #[default]
    Dark,
    /// Light theme.
    Light,
}

impl Theme {
    /// `"light"` or `"dark"`; anything else (or nothing) is dark.
    #[must_use]
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("light") => Self::Light,
            _ => Self::Dark,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
