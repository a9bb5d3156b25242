//! Request-level checks that need no database: every one of these requests
//! is settled before a connection is made, or finds none to be had.

use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use serde_json::{json, Value};

use beer_night::auth::{SESSION_COOKIE, STATE_COOKIE, VERIFIER_COOKIE};
use beer_night::{db, AppState};

mod support;

fn test_state() -> web::Data<AppState> {
    let config = support::config(&[]);
    let pool = db::build_pool(&config.database_url, 1);

    web::Data::new(AppState::new(config, pool).unwrap())
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(test_state())
                .configure(beer_night::configure),
        )
        .await
    };
}

#[actix_rt::test]
async fn api_requires_a_session() {
    let app = app!();

    for uri in &[
        "/api/events",
        "/api/events/1/beers",
        "/api/breweries/all",
        "/api/whitelist",
        "/api/profile/reviews",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[actix_rt::test]
async fn writes_require_a_session_before_the_body_is_read() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/events")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn session_endpoint_rejects_anonymous_requests() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/auth/session")
        .cookie(Cookie::new(SESSION_COOKIE, ""))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn login_redirects_to_google() {
    let app = app!();

    let req = test::TestRequest::get().uri("/auth/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .to_owned();
    assert!(location.starts_with("https://accounts.google.com/"));
    assert!(location.contains("code_challenge="));
    assert!(location.contains("redirect_uri=https%3A%2F%2Fbeer.example.com%2Fauth%2Fcallback"));

    let cookies: Vec<String> = resp
        .response()
        .cookies()
        .map(|cookie| cookie.name().to_owned())
        .collect();
    assert!(cookies.iter().any(|name| name == STATE_COOKIE));
    assert!(cookies.iter().any(|name| name == VERIFIER_COOKIE));
}

#[actix_rt::test]
async fn callback_without_code_is_rejected() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/auth/callback?state=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing authorization code" }));
}

#[actix_rt::test]
async fn callback_with_mismatched_state_is_rejected() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/auth/callback?code=xyz&state=forged")
        .cookie(Cookie::new(STATE_COOKIE, "expected"))
        .cookie(Cookie::new(VERIFIER_COOKIE, "verifier"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Invalid sign-in state" }));
}

#[actix_rt::test]
async fn provider_refusal_is_access_denied() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/auth/callback?error=access_denied")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "AccessDenied" }));
}

#[actix_rt::test]
async fn logout_without_a_session_succeeds() {
    let app = app!();

    let req = test::TestRequest::post().uri("/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let removed = resp
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(removed.value(), "");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "success": true }));
}

#[actix_rt::test]
async fn whitelist_lookup_failure_denies_sign_in() {
    let provider = support::spawn_identity_provider();
    let config = support::config(&support::as_pairs(&provider));

    // Nothing listens on port 1, so every checkout fails quickly.
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_millis(250))
        .build_unchecked(ConnectionManager::<PgConnection>::new("postgres://127.0.0.1:1/missing"));
    let state = web::Data::new(AppState::new(config, pool).unwrap());

    let app = test::init_service(App::new().app_data(state).configure(beer_night::configure)).await;

    let req = test::TestRequest::get()
        .uri("/auth/callback?code=ann%40example.com&state=s")
        .cookie(Cookie::new(STATE_COOKIE, "s"))
        .cookie(Cookie::new(VERIFIER_COOKIE, "verifier"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "AccessDenied" }));
}
