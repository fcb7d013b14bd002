//! WhatsApp click-to-chat links.
//!
//! Operators configure a message template with `{placeholder}` tokens; this
//! module fills it from a listing's details and wraps the result in a
//! `https://wa.me/` deep link.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::types::Locale;

const FALLBACK_AR_LISTING: &str = "مرحبًا، أريد الاستفسار عن هذا العقار: {listing_url}";
const FALLBACK_EN_LISTING: &str = "Hi, I'd like to inquire about this listing: {listing_url}";
const FALLBACK_AR_GENERIC: &str = "مرحبًا، أريد الاستفسار عن خدماتكم.";
const FALLBACK_EN_GENERIC: &str = "Hi, I'd like to inquire about your services.";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\{(\w+)\}").unwrap()
});

/// A price or other value that may be numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhatsAppValue {
    Text(String),
    Number(Decimal),
}

impl WhatsAppValue {
    fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Number(number) => Cow::Owned(number.normalize().to_string()),
        }
    }
}

impl From<&str> for WhatsAppValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for WhatsAppValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for WhatsAppValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

/// Values available to a message template.
///
/// Each field backs the placeholder of the same name; `reference` backs
/// `{ref}`. Missing values render as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhatsAppParams {
    /// Overrides the locale's brand name when non-empty.
    pub brand: Option<String>,
    pub listing_url: Option<String>,
    pub listing_title: Option<String>,
    pub price: Option<WhatsAppValue>,
    pub area: Option<String>,
    pub city: Option<String>,
    pub reference: Option<String>,
    pub purpose: Option<String>,
    pub property_type: Option<String>,
}

impl WhatsAppParams {
    fn lookup<'a>(&'a self, key: &str, brand: &'a str) -> Option<Cow<'a, str>> {
        let text = |value: &'a Option<String>| Cow::Borrowed(value.as_deref().unwrap_or(""));
        Some(match key {
            "brand" => Cow::Borrowed(brand),
            "listing_url" => text(&self.listing_url),
            "listing_title" => text(&self.listing_title),
            "price" => self
                .price
                .as_ref()
                .map_or(Cow::Borrowed(""), WhatsAppValue::render),
            "area" => text(&self.area),
            "city" => text(&self.city),
            "ref" => text(&self.reference),
            "purpose" => text(&self.purpose),
            "property_type" => text(&self.property_type),
            _ => return None,
        })
    }
}

fn apply_template(template: &str, params: &WhatsAppParams, brand: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps.get(1).map_or("", |m| m.as_str());
            params.lookup(key, brand).map_or_else(
                || caps.get(0).map_or_else(String::new, |m| m.as_str().to_owned()),
                Cow::into_owned,
            )
        })
        .into_owned()
}

/// Build the plain-text message.
///
/// A blank (or absent) template falls back to a fixed sentence in `locale`,
/// mentioning the listing URL when one is set. Unknown `{tokens}` are left
/// as written.
#[must_use]
pub fn build_message_plain(
    params: &WhatsAppParams,
    template: Option<&str>,
    locale: Locale,
) -> String {
    let brand = params
        .brand
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| locale.brand());

    let trimmed = template.map_or("", str::trim);
    if !trimmed.is_empty() {
        return apply_template(trimmed, params, brand);
    }

    let has_listing = params.listing_url.as_deref().is_some_and(|url| !url.is_empty());
    match (has_listing, locale) {
        (true, Locale::Ar) => apply_template(FALLBACK_AR_LISTING, params, brand),
        (true, Locale::En) => apply_template(FALLBACK_EN_LISTING, params, brand),
        (false, Locale::Ar) => FALLBACK_AR_GENERIC.to_owned(),
        (false, Locale::En) => FALLBACK_EN_GENERIC.to_owned(),
    }
}

/// [`build_message_plain`], percent-encoded for a URL query value.
#[must_use]
pub fn build_message_encoded(
    params: &WhatsAppParams,
    template: Option<&str>,
    locale: Locale,
) -> String {
    urlencoding::encode(&build_message_plain(params, template, locale)).into_owned()
}

/// Build a `wa.me` link, or `None` when there is no usable phone number.
///
/// Only the digits of `phone` are kept; no country-code validation happens
/// here. `encoded_message` is embedded as-is.
#[must_use]
pub fn build_link(phone: Option<&str>, encoded_message: &str) -> Option<String> {
    let digits: String = phone?.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("https://wa.me/{digits}?text={encoded_message}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_link_without_phone_is_none() {
        assert_eq!(build_link(None, "x"), None);
        assert_eq!(build_link(Some("n/a"), "x"), None);
    }

    #[test]
    fn test_link_strips_non_digits() {
        assert_eq!(
            build_link(Some("+20 100 000 0001"), "hello").as_deref(),
            Some("https://wa.me/201000000001?text=hello")
        );
    }

    #[test]
    fn test_template_substitution() {
        let params = WhatsAppParams {
            brand: Some("X".to_owned()),
            listing_url: Some("http://a".to_owned()),
            ..WhatsAppParams::default()
        };
        assert_eq!(
            build_message_plain(&params, Some("Hi {brand}, re {listing_url}"), Locale::En),
            "Hi X, re http://a"
        );
    }

    #[test]
    fn test_unknown_token_left_verbatim() {
        let params = WhatsAppParams::default();
        assert_eq!(
            build_message_plain(&params, Some("{unknown} and {brand}"), Locale::En),
            "{unknown} and Hrtaj"
        );
    }

    #[test]
    fn test_known_but_missing_token_is_blank() {
        let params = WhatsAppParams::default();
        assert_eq!(
            build_message_plain(&params, Some("[{city}]"), Locale::En),
            "[]"
        );
    }

    #[test]
    fn test_numeric_price() {
        let params = WhatsAppParams {
            price: Some(Decimal::new(250_000_000, 2).into()),
            ..WhatsAppParams::default()
        };
        assert_eq!(
            build_message_plain(&params, Some("EGP {price}"), Locale::En),
            "EGP 2500000"
        );
    }

    #[test]
    fn test_reference_placeholder() {
        let params = WhatsAppParams {
            reference: Some("req-1".to_owned()),
            ..WhatsAppParams::default()
        };
        assert_eq!(
            build_message_plain(&params, Some("  ref={ref}  "), Locale::Ar),
            "ref=req-1"
        );
    }

    #[test]
    fn test_blank_template_uses_listing_fallback() {
        let params = WhatsAppParams {
            listing_url: Some("https://hrtaj.com/l/1".to_owned()),
            ..WhatsAppParams::default()
        };
        assert_eq!(
            build_message_plain(&params, Some("   "), Locale::En),
            "Hi, I'd like to inquire about this listing: https://hrtaj.com/l/1"
        );
        assert!(
            build_message_plain(&params, None, Locale::Ar).ends_with("https://hrtaj.com/l/1")
        );
    }

    #[test]
    fn test_generic_fallback() {
        let params = WhatsAppParams::default();
        assert_eq!(
            build_message_plain(&params, None, Locale::En),
            "Hi, I'd like to inquire about your services."
        );
        assert_eq!(
            build_message_plain(&params, None, Locale::Ar),
            "مرحبًا، أريد الاستفسار عن خدماتكم."
        );
    }

    #[test]
    fn test_empty_brand_override_uses_locale_brand() {
        let params = WhatsAppParams {
            brand: Some(String::new()),
            ..WhatsAppParams::default()
        };
        assert_eq!(build_message_plain(&params, Some("{brand}"), Locale::En), "Hrtaj");
    }

    #[test]
    fn test_encoded_message() {
        let params = WhatsAppParams::default();
        assert_eq!(
            build_message_encoded(&params, Some("Hi {brand}!"), Locale::En),
            "Hi%20Hrtaj%21"
        );
    }
}
