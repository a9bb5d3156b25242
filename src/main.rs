use std::io;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{info, warn};

use beer_night::config::Config;
use beer_night::db::{self, sessions::PurgeExpiredSessions};
use beer_night::AppState;

fn startup_error<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(startup_error)?;
    let listen_addr = config.listen_addr;

    // Create a connection pool to the database and bring the schema up to date.
    let pool = db::build_pool(&config.database_url, config.pool_size);
    db::run_migrations(&pool).map_err(startup_error)?;

    match db::execute(&pool, PurgeExpiredSessions).await {
        Ok(purged) => info!("Purged {} expired session(s)", purged),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }

    let state = web::Data::new(AppState::new(config, pool).map_err(startup_error)?);

    let server = HttpServer::new(move || {
        let cors = match &state.config.cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::default(),
        };

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(beer_night::configure)
    })
    .bind(listen_addr)?;

    info!("Listening on {}", listen_addr);

    server.run().await
}
