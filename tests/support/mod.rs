//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;

use beer_night::config::Config;

/// Configuration with every required variable set, plus `extra`.
pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://localhost/beer_night_test"),
        ("GOOGLE_CLIENT_ID", "client-id"),
        ("GOOGLE_CLIENT_SECRET", "client-secret"),
        ("PUBLIC_URL", "https://beer.example.com"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

async fn token(form: web::Form<HashMap<String, String>>) -> HttpResponse {
    let code = form.get("code").cloned().unwrap_or_default();

    HttpResponse::Ok().json(json!({
        "access_token": code,
        "token_type": "bearer",
        "expires_in": 3600,
    }))
}

async fn userinfo(req: HttpRequest) -> HttpResponse {
    let email = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_owned();

    HttpResponse::Ok().json(json!({
        "email": email,
        "email_verified": true,
        "name": "Test Taster",
    }))
}

/// Starts a stand-in identity provider on a free local port. The token it
/// issues is the authorization code, and its userinfo endpoint reports that
/// token as the email, so `?code=<email>` signs in as `<email>`.
///
/// Returns the variables pointing the app at it.
pub fn spawn_identity_provider() -> Vec<(String, String)> {
    let server = HttpServer::new(|| {
        App::new()
            .route("/token", web::post().to(token))
            .route("/userinfo", web::get().to(userinfo))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let base = format!("http://{}", server.addrs()[0]);
    actix_rt::spawn(server.run());

    vec![
        ("OAUTH_TOKEN_URL".to_owned(), format!("{}/token", base)),
        ("OAUTH_USERINFO_URL".to_owned(), format!("{}/userinfo", base)),
    ]
}

pub fn as_pairs(vars: &[(String, String)]) -> Vec<(&str, &str)> {
    vars.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}
