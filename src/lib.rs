#[macro_use]
extern crate diesel;
#[macro_use]
extern crate log;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod stats;
pub mod validation;

use actix_web::web;

use self::auth::AuthClient;
use self::config::Config;
use self::error::{Error, Result};

/// Shared by every worker; handlers receive it as `web::Data<AppState>`.
pub struct AppState {
    pub config: Config,
    pub pool: db::Pool,
    pub auth: AuthClient,
}

impl AppState {
    pub fn new(config: Config, pool: db::Pool) -> Result<AppState> {
        let auth = AuthClient::new(&config)?;

        Ok(AppState { config, pool, auth })
    }
}

/// Registers the sign-in routes and the JSON API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/auth")
                .route("/login", web::get().to(auth::login))
                .route("/callback", web::get().to(auth::callback))
                .route("/logout", web::post().to(auth::logout))
                .route("/session", web::get().to(auth::session)),
        )
        .service(web::scope("/api").configure(api::configure));
}

// Extractor failures answer with the same `{"error": ...}` body as handlers.

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| Error::bad_request(format!("Invalid request body: {}", err)).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| Error::NotFound("Not found").into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| Error::bad_request(format!("Invalid query string: {}", err)).into())
}
