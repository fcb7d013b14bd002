//! Router tests for the server-rendered pages: locale and theme, CSP,
//! login flow, role redirects and the owner console.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::{StatusCode, header};

use common::{
    CLIENT_IP, OWNER_SECRET, PASSWORD, app, app_with, body_text, config, config_with_owner_console,
    form_post, get, location, session_cookie, set_cookie,
};
use hrtaj_core::Role;
use hrtaj_web::db::ProfileRepository;
use hrtaj_web::models::AuditAction;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();

    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = app.send(get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Locale, theme and security headers
// =============================================================================

#[tokio::test]
async fn test_home_defaults_to_arabic_rtl_dark() {
    let app = app();
    let response = app.send(get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(response.headers(), "locale").unwrap();
    assert!(cookie.starts_with("locale=ar"));

    let html = body_text(response).await;
    assert!(html.contains(r#"<html lang="ar" dir="rtl" data-theme="dark">"#));
    assert!(html.contains("هارتچ"));
}

#[tokio::test]
async fn test_lang_query_beats_cookie_and_is_persisted() {
    let app = app();
    let request = axum::http::Request::get("/?lang=en")
        .header(header::COOKIE, "locale=ar; theme=light")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;

    let cookie = set_cookie(response.headers(), "locale").unwrap();
    assert!(cookie.starts_with("locale=en"));
    assert!(cookie.contains("Path=/"));

    let html = body_text(response).await;
    assert!(html.contains(r#"<html lang="en" dir="ltr" data-theme="light">"#));
    assert!(html.contains("Hrtaj"));
}

#[tokio::test]
async fn test_accept_language_selects_english() {
    let app = app();
    let request = axum::http::Request::get("/")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(axum::body::Body::empty())
        .unwrap();
    let html = body_text(app.send(request).await).await;
    assert!(html.contains(r#"lang="en""#));
}

#[tokio::test]
async fn test_english_flag_off_forces_arabic() {
    let mut config = config();
    config.flags.english = false;
    let app = app_with(config);

    let response = app.send(get("/?lang=en", Some("locale=en"))).await;
    assert!(set_cookie(response.headers(), "locale").unwrap().starts_with("locale=ar"));
    let html = body_text(response).await;
    assert!(html.contains(r#"lang="ar" dir="rtl""#));
}

#[tokio::test]
async fn test_csp_nonce_matches_theme_script() {
    let app = app();
    let response = app.send(get("/", None)).await;

    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned();
    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap()
        .to_owned();
    assert!(!nonce.is_empty());
    assert!(response.headers().contains_key("x-request-id"));

    let html = body_text(response).await;
    assert!(html.contains(&format!(r#"<script nonce="{nonce}">"#)));
}

// =============================================================================
// Login flow
// =============================================================================

#[tokio::test]
async fn test_signed_out_page_redirects_to_login() {
    let app = app();

    let response = app.send(get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth?next=%2Fdashboard");

    let response = app.send(get("/team", None)).await;
    assert_eq!(location(&response), "/team/login?next=%2Fteam");
}

#[tokio::test]
async fn test_login_page_renders_error_and_next() {
    let app = app();
    let response = app
        .send(get("/auth?error=account_disabled&next=%2Fteam", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("تم إيقاف هذا الحساب"));
    assert!(html.contains(r#"name="next" value="/team""#));
}

#[tokio::test]
async fn test_login_success_follows_safe_next() {
    let app = app();
    app.account("mona@example.com", Some(Role::Staff));

    let body = format!("email=mona%40example.com&password={}&next=%2Fteam", urlencoding::encode(PASSWORD));
    let response = app.send(form_post("/auth/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/team");
    let cookie = session_cookie(response.headers()).unwrap();

    let response = app.send(get("/team", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("mona@example.com"));
}

#[tokio::test]
async fn test_login_rejects_offsite_next() {
    let app = app();
    app.account("mona@example.com", None);

    let body = format!(
        "email=mona%40example.com&password={}&next=%2F%2Fevil.example",
        urlencoding::encode(PASSWORD)
    );
    let response = app.send(form_post("/auth/login", &body, None)).await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_login_wrong_password_redirects_with_error() {
    let app = app();
    app.account("mona@example.com", None);

    let response = app
        .send(form_post("/auth/login", "email=mona%40example.com&password=nope", None))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth?error=invalid_credentials"));
    assert!(session_cookie(response.headers()).is_none());
}

#[tokio::test]
async fn test_team_login_failure_returns_to_team_login() {
    let app = app();
    let response = app
        .send(form_post(
            "/auth/login",
            "email=nobody%40example.com&password=nope&surface=team",
            None,
        ))
        .await;
    assert!(location(&response).starts_with("/team/login?error=invalid_credentials"));
}

#[tokio::test]
async fn test_login_disabled_account() {
    let app = app();
    let id = app.account("mona@example.com", Some(Role::Staff));
    app.store.set_disabled(id, true).await.unwrap();

    let body = format!("email=mona%40example.com&password={}", urlencoding::encode(PASSWORD));
    let response = app.send(form_post("/auth/login", &body, None)).await;
    assert!(location(&response).starts_with("/auth?error=account_disabled"));
}

#[tokio::test]
async fn test_login_requires_client_ip_for_rate_limiting() {
    let app = app();
    let request = axum::http::Request::post("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("email=a%40b.c&password=x"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = app();
    let (_, cookie) = app.signed_in("mona@example.com", Role::User).await;

    let response = app.send(form_post("/auth/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// =============================================================================
// Role guards
// =============================================================================

#[tokio::test]
async fn test_wrong_role_redirects_to_dashboard_notice() {
    let app = app();
    let (_, cookie) = app.signed_in("buyer@example.com", Role::User).await;

    let response = app.send(get("/team", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?unauthorized=1");

    let response = app.send(get("/dashboard?unauthorized=1", Some(&cookie))).await;
    let html = body_text(response).await;
    assert!(html.contains("ليست لديك صلاحية"));
}

#[tokio::test]
async fn test_demotion_applies_on_next_request() {
    let app = app();
    let (id, cookie) = app.signed_in("ops@example.com", Role::Ops).await;
    assert_eq!(app.send(get("/team", Some(&cookie))).await.status(), StatusCode::OK);

    app.store.update_role(id, Role::User).await.unwrap();
    let response = app.send(get("/team", Some(&cookie))).await;
    assert_eq!(location(&response), "/dashboard?unauthorized=1");
}

#[tokio::test]
async fn test_disabled_account_is_signed_out() {
    let app = app();
    let (id, cookie) = app.signed_in("ops@example.com", Role::Ops).await;
    assert_eq!(app.send(get("/team", Some(&cookie))).await.status(), StatusCode::OK);

    app.store.set_disabled(id, true).await.unwrap();
    let response = app.send(get("/team", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/team/login?next=%2Fteam");

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(location(&response), "/auth?next=%2Fdashboard");
}

#[tokio::test]
async fn test_account_without_profile_is_least_privileged() {
    let app = app();
    app.account("bare@example.com", None);
    let cookie = app.login("bare@example.com").await;

    let html = body_text(app.send(get("/dashboard", Some(&cookie))).await).await;
    assert!(html.contains("<dd>user</dd>"));
    assert!(!html.contains(r#"href="/team""#));
}

// =============================================================================
// Owner console
// =============================================================================

#[tokio::test]
async fn test_owner_console_disabled_without_secret() {
    let app = app();
    let (_, cookie) = app.signed_in("owner@example.com", Role::Owner).await;

    let response = app.send(get("/owner", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_console_requires_owner_role() {
    let app = app_with(config_with_owner_console());
    let (_, cookie) = app.signed_in("admin@example.com", Role::Admin).await;

    let response = app.send(get("/owner", Some(&cookie))).await;
    assert_eq!(location(&response), "/dashboard?unauthorized=1");
}

#[tokio::test]
async fn test_owner_unlock_flow() {
    let app = app_with(config_with_owner_console());
    let (owner_id, session) = app.signed_in("owner@example.com", Role::Owner).await;

    let html = body_text(app.send(get("/owner", Some(&session))).await).await;
    assert!(html.contains(r#"action="/owner/unlock""#));

    let response = app
        .send(form_post("/owner/unlock", "secret=wrong&next=%2Fowner", Some(&session)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/owner?error=invalid_secret&unlock=1"));
    assert!(set_cookie(response.headers(), "owner_token").is_none());

    let body = format!("secret={}&next=%2Fowner", urlencoding::encode(OWNER_SECRET));
    let response = app.send(form_post("/owner/unlock", &body, Some(&session))).await;
    assert_eq!(location(&response), "/owner");
    let token = set_cookie(response.headers(), "owner_token").unwrap();
    assert!(token.contains("HttpOnly"));
    let token = token.split(';').next().unwrap().to_owned();

    let cookies = format!("{session}; {token}");
    let html = body_text(app.send(get("/owner", Some(&cookies))).await).await;
    assert!(html.contains(r#"action="/owner/lock""#));

    let entries = app.audit_entries(1).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::OwnerUnlocked);
    assert_eq!(entries[0].actor, Some(owner_id));
    assert_eq!(entries[0].ip.as_deref(), Some(CLIENT_IP));

    let response = app.send(form_post("/owner/lock", "", Some(&cookies))).await;
    assert_eq!(location(&response), "/owner");
    let cleared = set_cookie(response.headers(), "owner_token").unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_owner_page_rejects_forged_token() {
    let app = app_with(config_with_owner_console());
    let (_, session) = app.signed_in("owner@example.com", Role::Owner).await;

    let cookies = format!("{session}; owner_token=guess");
    let html = body_text(app.send(get("/owner", Some(&cookies))).await).await;
    assert!(html.contains(r#"action="/owner/unlock""#));
}
