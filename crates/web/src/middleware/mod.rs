//! HTTP middleware stack for the web server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record on span, echo header)
//! 4. CSP nonce (generate per-request nonce for the inline theme script)
//! 5. Session layer (tower-sessions)
//! 6. Locale/theme negotiation (locale cookie on every response)
//! 7. Security headers (CSP, HSTS, etc.)
//!
//! Rate limiting (governor) is applied per route.

pub mod auth;
pub mod cookies;
pub mod csp;
pub mod locale;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AccessPolicy, AdminAccess, AuthRejection, Authorized, ImportAccess, LoginSurface,
    OptionalUser, OwnerConsole, OwnerRoleAccess, SignedIn, TeamAccess, clear_current_user,
    set_current_user,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use locale::locale_middleware;
pub use rate_limit::{login_rate_limiter, precheck_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
