//! Web server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HRTAJ_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `HRTAJ_SITE_URL` - Public URL of the site, used for absolute links and cookie security
//!
//! ## Optional
//! - `HRTAJ_HOST` - Bind address (default: 127.0.0.1)
//! - `HRTAJ_PORT` - Listen port (default: 3000)
//! - `OWNER_SECRET` - Shared secret unlocking the owner console (console disabled when unset)
//! - `HRTAJ_IMPORT_API_URL` / `HRTAJ_IMPORT_API_KEY` - Listing import service
//! - `HRTAJ_WHATSAPP_NUMBER` - Sales WhatsApp number
//! - `HRTAJ_WHATSAPP_TEMPLATE_AR` / `HRTAJ_WHATSAPP_TEMPLATE_EN` - Callback message templates
//! - `HRTAJ_ENABLE_COMPARE`, `HRTAJ_ENABLE_SAVED_SEARCH`, `HRTAJ_ENABLE_ENGLISH`,
//!   `HRTAJ_ENABLE_LEAD_CRM` - Feature flags (default on; `1`/`true` enable)
//! - `HRTAJ_COMMIT_SHA` / `HRTAJ_BUILD_TIMESTAMP` - Override the build stamp
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_OWNER_SECRET_LENGTH: usize = 24;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default callback message templates, filled by the WhatsApp engine.
const DEFAULT_CALLBACK_TEMPLATE_AR: &str =
    "مرحبًا {brand}، أرسلت طلب اتصال وأود المتابعة عبر واتساب. رقم الطلب: {ref}";
const DEFAULT_CALLBACK_TEMPLATE_EN: &str =
    "Hi {brand}, I just requested a callback and would like to continue on WhatsApp. Reference: {ref}";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub site_url: Url,
    /// Owner console shared secret; `None` disables the console
    pub owner_secret: Option<SecretString>,
    /// Listing import service; `None` disables the import proxy
    pub import: Option<ImportConfig>,
    /// WhatsApp contact settings
    pub whatsapp: WhatsAppConfig,
    /// Feature flags
    pub flags: FeatureFlags,
    /// Build stamp reported by `/api/version`
    pub build: BuildInfo,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Error event sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Performance trace sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// External listing import service.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ImportConfig {
    /// Base URL; requests go to `<base>/v1/import/<kind>`
    pub base_url: Url,
    /// Sent as `X-HRTAJ-IMPORT-KEY`
    pub api_key: SecretString,
}

impl std::fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// WhatsApp contact settings.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Sales number in any format; only digits end up in links
    pub number: Option<String>,
    /// Callback follow-up template (Arabic)
    pub callback_template_ar: String,
    /// Callback follow-up template (English)
    pub callback_template_en: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            number: None,
            callback_template_ar: DEFAULT_CALLBACK_TEMPLATE_AR.to_owned(),
            callback_template_en: DEFAULT_CALLBACK_TEMPLATE_EN.to_owned(),
        }
    }
}

impl WhatsAppConfig {
    /// Callback template for `locale`.
    #[must_use]
    pub fn callback_template(&self, locale: hrtaj_core::Locale) -> &str {
        match locale {
            hrtaj_core::Locale::Ar => &self.callback_template_ar,
            hrtaj_core::Locale::En => &self.callback_template_en,
        }
    }
}

/// Runtime feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    /// Listing comparison UI
    pub compare: bool,
    /// Saved searches UI
    pub saved_search: bool,
    /// English locale; when off every request resolves to Arabic
    pub english: bool,
    /// Lead CRM and its export
    pub lead_crm: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            compare: true,
            saved_search: true,
            english: true,
            lead_crm: true,
        }
    }
}

/// Source revision and build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub commit_sha: String,
    pub build_timestamp: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            commit_sha: env!("HRTAJ_BUILD_COMMIT").to_owned(),
            build_timestamp: env!("HRTAJ_BUILD_TIMESTAMP").to_owned(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("HRTAJ_DATABASE_URL")?;
        let host = get_env_or_default("HRTAJ_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HRTAJ_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("HRTAJ_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("HRTAJ_PORT".to_string(), e.to_string()))?;
        let site_url = parse_url("HRTAJ_SITE_URL", &get_required_env("HRTAJ_SITE_URL")?)?;

        let owner_secret = match get_optional_env("OWNER_SECRET") {
            Some(value) => {
                validate_owner_secret(&value, "OWNER_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let import = ImportConfig::from_env()?;
        let whatsapp = WhatsAppConfig::from_env();
        let flags = FeatureFlags::from_env();
        let build = BuildInfo::from_env();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_sample_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            site_url,
            owner_secret,
            import,
            whatsapp,
            flags,
            build,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for tests and local tooling: no owner console, no
    /// import service, default flags.
    #[must_use]
    pub fn for_site(site_url: Url) -> Self {
        Self {
            database_url: SecretString::from(String::new()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            site_url,
            owner_secret: None,
            import: None,
            whatsapp: WhatsAppConfig::default(),
            flags: FeatureFlags::default(),
            build: BuildInfo::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.site_url.scheme() == "https"
    }

    /// Whether the owner console is enabled.
    #[must_use]
    pub fn owner_console_enabled(&self) -> bool {
        self.owner_secret
            .as_ref()
            .is_some_and(|secret| !secret.expose_secret().is_empty())
    }
}

impl ImportConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env("HRTAJ_IMPORT_API_URL") else {
            return Ok(None);
        };
        let base_url = parse_url("HRTAJ_IMPORT_API_URL", &raw_url)?;
        let api_key = get_validated_secret("HRTAJ_IMPORT_API_KEY")?;
        Ok(Some(Self { base_url, api_key }))
    }

    /// Endpoint for an import of `kind`.
    #[must_use]
    pub fn endpoint(&self, kind: &str) -> String {
        format!(
            "{}/v1/import/{kind}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

impl WhatsAppConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            number: get_optional_env("HRTAJ_WHATSAPP_NUMBER"),
            callback_template_ar: get_optional_env("HRTAJ_WHATSAPP_TEMPLATE_AR")
                .unwrap_or(defaults.callback_template_ar),
            callback_template_en: get_optional_env("HRTAJ_WHATSAPP_TEMPLATE_EN")
                .unwrap_or(defaults.callback_template_en),
        }
    }
}

impl FeatureFlags {
    fn from_env() -> Self {
        Self {
            compare: get_flag("HRTAJ_ENABLE_COMPARE"),
            saved_search: get_flag("HRTAJ_ENABLE_SAVED_SEARCH"),
            english: get_flag("HRTAJ_ENABLE_ENGLISH"),
            lead_crm: get_flag("HRTAJ_ENABLE_LEAD_CRM"),
        }
    }
}

impl BuildInfo {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            commit_sha: get_optional_env("HRTAJ_COMMIT_SHA").unwrap_or(defaults.commit_sha),
            build_timestamp: get_optional_env("HRTAJ_BUILD_TIMESTAMP")
                .unwrap_or(defaults.build_timestamp),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a feature flag. Unset means on.
fn get_flag(key: &str) -> bool {
    get_optional_env(key).is_none_or(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}

fn get_sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate the owner secret: long enough, then placeholder and entropy checks.
fn validate_owner_secret(value: &str, var_name: &str) -> Result<(), ConfigError> {
    if value.chars().count() < MIN_OWNER_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_OWNER_SECRET_LENGTH,
                value.chars().count()
            ),
        ));
    }
    validate_secret_strength(value, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
