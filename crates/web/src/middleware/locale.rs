//! Locale and theme negotiation.
//!
//! Runs on every request. The resolved [`Locale`] overwrites any
//! client-supplied `x-locale` header, both values are available to handlers
//! as request extensions, and the locale cookie is refreshed on the way out.

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue,
        header::{ACCEPT_LANGUAGE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};

use hrtaj_core::locale::{LOCALE_COOKIE, LOCALE_HEADER, THEME_COOKIE};
use hrtaj_core::{Locale, Theme};

use super::cookies::{locale_cookie, read_cookie, set_cookie_value};
use crate::state::AppState;

/// Resolve locale and theme for the request and persist the locale cookie.
pub async fn locale_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = if state.config().flags.english {
        let headers = request.headers();
        let query_lang = request.uri().query().and_then(lang_param);
        let cookie = read_cookie(headers, LOCALE_COOKIE);
        let accept = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        Locale::resolve(query_lang.as_deref(), cookie.as_deref(), accept)
    } else {
        Locale::Ar
    };
    let theme = Theme::normalize(read_cookie(request.headers(), THEME_COOKIE).as_deref());

    request
        .headers_mut()
        .insert(LOCALE_HEADER, HeaderValue::from_static(locale.as_str()));
    request.extensions_mut().insert(locale);
    request.extensions_mut().insert(theme);

    let mut response = next.run(request).await;

    if let Some(value) = set_cookie_value(&locale_cookie(locale)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// First `lang` value in a query string.
fn lang_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "lang")
        .map(|(_, value)| value.into_owned())
}
