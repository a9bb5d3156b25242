use actix_web::{web, HttpResponse};
use serde_derive::Deserialize;

use super::created;
use crate::auth::SessionUser;
use crate::db::{
    self,
    breweries::{BreweryDirectory, SearchBreweries, UpsertBrewery},
};
use crate::error::{Error, Result};
use crate::stats;
use crate::validation::non_blank;
use crate::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct BreweryForm {
    pub name: Option<String>,
}

/// Route handler for brewery autocomplete. Without `q`, lists every brewery.
pub async fn search(
    _user: SessionUser,
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let term = non_blank(params.q.as_deref()).map(str::to_owned);
    let breweries = db::execute(&state.pool, SearchBreweries { term }).await?;

    Ok(HttpResponse::Ok().json(breweries))
}

/// Route handler returning the brewery with this name, ignoring case,
/// creating it first when needed.
pub async fn create(
    _user: SessionUser,
    state: web::Data<AppState>,
    form: web::Json<BreweryForm>,
) -> Result<HttpResponse> {
    let name = non_blank(form.name.as_deref())
        .ok_or_else(|| Error::bad_request("Brewery name is required"))?
        .to_owned();

    let brewery = db::execute(&state.pool, UpsertBrewery { name }).await?;

    Ok(created(&brewery))
}

/// Route handler listing every brewery with the beers filed under it.
pub async fn directory(_user: SessionUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (beers, reviews, events) = db::execute(&state.pool, BreweryDirectory).await?;

    Ok(HttpResponse::Ok().json(stats::brewery_directory(&beers, &reviews, &events)))
}
