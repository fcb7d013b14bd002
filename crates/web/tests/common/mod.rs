//! Shared harness for router tests: in-memory repositories and sessions.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, Response, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use hrtaj_core::{Email, ProfileId, Role};
use hrtaj_web::config::WebConfig;
use hrtaj_web::db::Repositories;
use hrtaj_web::db::memory::MemoryStore;
use hrtaj_web::middleware::create_session_layer;
use hrtaj_web::models::AuditEntry;
use hrtaj_web::routes;
use hrtaj_web::services::auth::hash_password;
use hrtaj_web::state::AppState;

pub const PASSWORD: &str = "correct horse battery";
pub const OWNER_SECRET: &str = "kT9vQ2mZ7wL4pR8xN3bH6cJ1";
pub const CLIENT_IP: &str = "203.0.113.10";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn config() -> WebConfig {
    WebConfig::for_site(Url::parse("http://localhost:3000").unwrap())
}

pub fn config_with_owner_console() -> WebConfig {
    let mut config = config();
    config.owner_secret = Some(SecretString::from(OWNER_SECRET.to_owned()));
    config
}

pub fn app_with(config: WebConfig) -> TestApp {
    let (repos, store) = Repositories::in_memory();
    let state = AppState::new(config.clone(), repos).unwrap();
    let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), &config);
    TestApp {
        router: routes::app(state, session_layer),
        store,
    }
}

pub fn app() -> TestApp {
    app_with(config())
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Seed an account with [`PASSWORD`] and the given role.
    pub fn account(&self, email: &str, role: Option<Role>) -> ProfileId {
        let hash = hash_password(PASSWORD).unwrap();
        self.store
            .seed_account(&Email::parse(email).unwrap(), Some(&hash), role)
            .unwrap()
    }

    /// Log in and return the session cookie pair (`name=value`).
    pub async fn login(&self, email: &str) -> String {
        let body = format!(
            "email={}&password={}",
            urlencoding::encode(email),
            urlencoding::encode(PASSWORD)
        );
        let response = self.send(form_post("/auth/login", &body, None)).await;
        assert_eq!(response.status(), 303);
        session_cookie(response.headers()).expect("login sets a session cookie")
    }

    /// Seed an account with `role` and log it in.
    pub async fn signed_in(&self, email: &str, role: Role) -> (ProfileId, String) {
        let id = self.account(email, Some(role));
        let cookie = self.login(email).await;
        (id, cookie)
    }

    /// Wait for the background audit writer.
    pub async fn audit_entries(&self, expected: usize) -> Vec<AuditEntry> {
        for _ in 0..50 {
            let entries = self.store.audit_entries();
            if entries.len() >= expected {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.store.audit_entries()
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri).header("x-forwarded-for", CLIENT_IP);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub fn json_post(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::USER_AGENT, "router-tests")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` of the first `Set-Cookie` for `name`.
pub fn set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(str::to_owned)
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    set_cookie(headers, "hrtaj_session")
        .and_then(|c| c.split(';').next().map(str::to_owned))
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
