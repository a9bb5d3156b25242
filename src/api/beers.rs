use actix_web::{web, HttpResponse};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use super::{created, success};
use crate::auth::SessionUser;
use crate::db::{
    self,
    beers::{CreateBeer, DeleteBeer, ListBeers, UpdateBeer},
};
use crate::error::{Error, Result};
use crate::models::Beer;
use crate::stats::{self, RatingSummary};
use crate::validation::{non_blank, parse_abv, BreweryFields};
use crate::AppState;

const BEER_NOT_FOUND: &str = "Beer not found";

#[derive(Deserialize)]
pub struct BeerForm {
    /// The name of the beer.
    pub name: Option<String>,

    /// Names of the breweries behind the beer.
    pub breweries: Option<Vec<String>>,

    /// A single brewery name, as sent by older clients.
    pub brewery: Option<String>,

    pub style: Option<String>,

    /// Alcohol by volume, 0 - 100, as a number or numeric text.
    pub abv: Option<Value>,
}

impl BeerForm {
    fn brewery_fields(&self) -> Option<BreweryFields> {
        BreweryFields::from_input(self.breweries.as_deref(), self.brewery.as_deref())
    }
}

#[derive(Serialize)]
pub struct BeerWithRating {
    #[serde(flatten)]
    pub beer: Beer,

    #[serde(flatten)]
    pub rating: RatingSummary,
}

/// Route handler listing the beers of an event with their average rating.
pub async fn list(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let (beers, reviews) = db::execute(
        &state.pool,
        ListBeers {
            event_id: path.into_inner(),
        },
    )
    .await?;

    let mut ratings = stats::summarize_by_beer(&reviews);
    let beers: Vec<BeerWithRating> = beers
        .into_iter()
        .map(|beer| BeerWithRating {
            rating: ratings.remove(&beer.id).unwrap_or_default(),
            beer,
        })
        .collect();

    Ok(HttpResponse::Ok().json(beers))
}

/// Route handler adding a beer to an event
///
/// Expects the following JSON body:
///
/// - `name`: The name of the beer, required
/// - `breweries`: The names of its breweries
/// - `style`: The beer's style
/// - `abv`: Alcohol by volume, 0 - 100
///
/// Brewery names missing from the brewery table are added to it.
pub async fn create(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<BeerForm>,
) -> Result<HttpResponse> {
    let name = non_blank(form.name.as_deref())
        .ok_or_else(|| Error::bad_request("Beer name is required"))?
        .to_owned();
    let abv = parse_abv(form.abv.as_ref())?;

    let beer = db::execute(
        &state.pool,
        CreateBeer {
            event_id: path.into_inner(),
            name,
            breweries: form.brewery_fields().unwrap_or_default(),
            style: form.style.as_deref().map(str::trim).unwrap_or_default().to_owned(),
            abv,
        },
    )
    .await?
    .ok_or(Error::NotFound("Event not found"))?;

    Ok(created(&beer))
}

/// Route handler applying the fields present in the body to a beer. A blank
/// name is ignored.
pub async fn update(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
    form: web::Json<BeerForm>,
) -> Result<HttpResponse> {
    let (event_id, beer_id) = path.into_inner();

    let abv = match &form.abv {
        Some(value) => Some(parse_abv(Some(value))?),
        None => None,
    };

    let beer = db::execute(
        &state.pool,
        UpdateBeer {
            event_id,
            beer_id,
            name: non_blank(form.name.as_deref()).map(str::to_owned),
            breweries: form.brewery_fields(),
            style: form.style.as_deref().map(|s| s.trim().to_owned()),
            abv,
        },
    )
    .await?
    .ok_or(Error::NotFound(BEER_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(beer))
}

/// Route handler deleting a beer and its reviews.
pub async fn delete(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (event_id, beer_id) = path.into_inner();
    let existed = db::execute(&state.pool, DeleteBeer { event_id, beer_id }).await?;

    if !existed {
        return Err(Error::NotFound(BEER_NOT_FOUND));
    }

    Ok(success())
}
