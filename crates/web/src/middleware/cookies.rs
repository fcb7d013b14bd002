//! Plain (non-session) cookie helpers.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use hrtaj_core::locale::{LOCALE_COOKIE, PREFERENCE_COOKIE_MAX_AGE_SECS};
use hrtaj_core::Locale;

/// Owner console second-factor cookie.
pub const OWNER_TOKEN_COOKIE: &str = "owner_token";

/// Owner token lifetime (12 hours).
const OWNER_TOKEN_MAX_AGE_SECS: i64 = 12 * 60 * 60;

/// Value of the first cookie called `name`, if any.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

/// `locale=<v>; Path=/; Max-Age=<1 year>; SameSite=Lax`.
#[must_use]
pub fn locale_cookie(locale: Locale) -> Cookie<'static> {
    Cookie::build((LOCALE_COOKIE, locale.as_str()))
        .path("/")
        .max_age(Duration::seconds(PREFERENCE_COOKIE_MAX_AGE_SECS))
        .same_site(SameSite::Lax)
        .build()
}

/// The owner token cookie holding `token`.
#[must_use]
pub fn owner_token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OWNER_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(OWNER_TOKEN_MAX_AGE_SECS))
        .build()
}

/// Expired owner token cookie, clearing it in the browser.
#[must_use]
pub fn owner_token_removal(secure: bool) -> Cookie<'static> {
    Cookie::build((OWNER_TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .build()
}

/// Render a cookie as a `Set-Cookie` header value.
#[must_use]
pub fn set_cookie_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=light; locale=en"));
        assert_eq!(read_cookie(&headers, "locale").as_deref(), Some("en"));
        assert_eq!(read_cookie(&headers, "theme").as_deref(), Some("light"));
        assert_eq!(read_cookie(&headers, "owner_token"), None);
    }

    #[test]
    fn test_read_cookie_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("locale=ar"));
        assert_eq!(read_cookie(&headers, "locale").as_deref(), Some("ar"));
    }

    #[test]
    fn test_locale_cookie_attributes() {
        let rendered = locale_cookie(Locale::En).to_string();
        assert!(rendered.starts_with("locale=en"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=31536000"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(!rendered.contains("HttpOnly"));
    }

    #[test]
    fn test_owner_token_cookie_attributes() {
        let rendered = owner_token_cookie("t0k".to_owned(), true).to_string();
        assert!(rendered.starts_with("owner_token=t0k"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=43200"));

        let removal = owner_token_removal(false).to_string();
        assert!(removal.contains("Max-Age=0"));
    }
}
