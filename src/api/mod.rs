//! JSON endpoints under `/api`. Every handler requires a signed-in
//! [`SessionUser`](crate::auth::SessionUser).

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;

pub mod beers;
pub mod breweries;
pub mod events;
pub mod profile;
pub mod reviews;
pub mod whitelist;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events")
            .route(web::get().to(events::list))
            .route(web::post().to(events::create)),
    )
    .service(
        web::resource("/events/{id}")
            .route(web::get().to(events::get))
            .route(web::put().to(events::update))
            .route(web::delete().to(events::delete)),
    )
    .service(
        web::resource("/events/{id}/beers")
            .route(web::get().to(beers::list))
            .route(web::post().to(beers::create)),
    )
    .service(
        web::resource("/events/{id}/beers/{beer_id}")
            .route(web::put().to(beers::update))
            .route(web::delete().to(beers::delete)),
    )
    .service(
        web::resource("/events/{id}/beers/{beer_id}/reviews")
            .route(web::get().to(reviews::list))
            .route(web::post().to(reviews::create)),
    )
    .service(
        web::resource("/events/{id}/beers/{beer_id}/reviews/{review_id}")
            .route(web::put().to(reviews::update))
            .route(web::delete().to(reviews::delete)),
    )
    .service(
        web::resource("/breweries")
            .route(web::get().to(breweries::search))
            .route(web::post().to(breweries::create)),
    )
    .service(web::resource("/breweries/all").route(web::get().to(breweries::directory)))
    .service(
        web::resource("/whitelist")
            .route(web::get().to(whitelist::list))
            .route(web::post().to(whitelist::add))
            .route(web::delete().to(whitelist::remove)),
    )
    .service(web::resource("/profile/reviews").route(web::get().to(profile::reviews)));
}

pub(crate) fn created<T: Serialize>(body: &T) -> HttpResponse {
    HttpResponse::Created().json(body)
}

pub(crate) fn success() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true }))
}
