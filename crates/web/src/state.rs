//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::config::WebConfig;
use crate::db::{LeadRepository, ProfileRepository, Repositories, TeamSessionRepository};
use crate::services::{AuditSink, AuthService, FixedWindowLimiter, ImportClient, ImportError};

/// Callback form submissions allowed per client per window.
pub const CALLBACK_LIMIT: u32 = 8;

/// Callback rate-limit window.
pub const CALLBACK_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    repos: Repositories,
    audit: AuditSink,
    callback_limiter: FixedWindowLimiter,
    import: Option<ImportClient>,
    owner_secret_digest: Option<[u8; 32]>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Spawns the audit writer, so this must run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the import API client cannot be built.
    pub fn new(config: WebConfig, repos: Repositories) -> Result<Self, ImportError> {
        let audit = AuditSink::spawn(repos.audit_log.clone());
        let import = config.import.clone().map(ImportClient::new).transpose()?;
        let owner_secret_digest = config
            .owner_secret
            .as_ref()
            .map(|secret| secret.expose_secret())
            .filter(|secret| !secret.is_empty())
            .map(|secret| Sha256::digest(secret.as_bytes()).into());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                audit,
                callback_limiter: FixedWindowLimiter::new(CALLBACK_LIMIT, CALLBACK_WINDOW),
                import,
                owner_secret_digest,
            }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn profiles(&self) -> &Arc<dyn ProfileRepository> {
        &self.inner.repos.profiles
    }

    #[must_use]
    pub fn leads(&self) -> &Arc<dyn LeadRepository> {
        &self.inner.repos.leads
    }

    #[must_use]
    pub fn team_sessions(&self) -> &Arc<dyn TeamSessionRepository> {
        &self.inner.repos.team_sessions
    }

    /// Non-blocking audit writer.
    #[must_use]
    pub fn audit(&self) -> &AuditSink {
        &self.inner.audit
    }

    #[must_use]
    pub fn callback_limiter(&self) -> &FixedWindowLimiter {
        &self.inner.callback_limiter
    }

    /// Import API client; `None` when the import service is not configured.
    #[must_use]
    pub fn import(&self) -> Option<&ImportClient> {
        self.inner.import.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.repos.profiles.clone())
    }

    /// Whether `token` equals the owner secret, compared by SHA-256 digest.
    /// Always `false` when the owner console is disabled.
    #[must_use]
    pub fn owner_token_matches(&self, token: &str) -> bool {
        let Some(expected) = self.inner.owner_secret_digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        expected == actual
    }
}
