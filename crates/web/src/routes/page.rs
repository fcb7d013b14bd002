//! Per-request data every HTML page needs.

use axum::{extract::FromRequestParts, http::request::Parts};

use hrtaj_core::{Locale, Theme};

use crate::messages::Messages;
use crate::middleware::{CspNonce, OptionalUser};
use crate::models::CurrentUser;

/// Locale, theme, CSP nonce and signed-in user for the base layout.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub locale: Locale,
    pub theme: Theme,
    pub nonce: String,
    pub user: Option<CurrentUser>,
    pub t: &'static Messages,
}

impl PageContext {
    /// `lang` attribute value.
    #[must_use]
    pub const fn lang(&self) -> &'static str {
        self.locale.as_str()
    }

    /// `dir` attribute value.
    #[must_use]
    pub const fn dir(&self) -> &'static str {
        self.locale.direction()
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts.extensions.get::<Locale>().copied().unwrap_or_default();
        let theme = parts.extensions.get::<Theme>().copied().unwrap_or_default();
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state).await?;

        Ok(Self {
            locale,
            theme,
            nonce,
            user,
            t: Messages::for_locale(locale),
        })
    }
}
