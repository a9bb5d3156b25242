use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::breweries::upsert_brewery;
use super::Query;
use crate::error::{Error, Result};
use crate::models::{Beer, BeerChanges, NewBeer, Review};
use crate::schema::{beer, event, review};
use crate::validation::BreweryFields;

/*************************************/
/** List Beers query                **/
/*************************************/

/// Beers of an event in the order they were added, with their reviews.
pub struct ListBeers {
    pub event_id: i32,
}

impl Query for ListBeers {
    type Item = (Vec<Beer>, Vec<Review>);

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let beers = beer::table
            .filter(beer::event_id.eq(self.event_id))
            .order((beer::created_at.asc(), beer::id.asc()))
            .select(Beer::as_select())
            .load(conn)?;

        let beer_ids: Vec<i32> = beers.iter().map(|b| b.id).collect();
        let reviews = review::table
            .filter(review::beer_id.eq_any(beer_ids))
            .select(Review::as_select())
            .load(conn)?;

        Ok((beers, reviews))
    }
}

/*************************************/
/** Get Beer query                  **/
/*************************************/

pub struct GetBeer {
    pub event_id: i32,
    pub beer_id: i32,
}

impl Query for GetBeer {
    type Item = Option<Beer>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        find_beer(conn, self.event_id, self.beer_id)
    }
}

pub(crate) fn find_beer(conn: &mut PgConnection, event_id: i32, beer_id: i32) -> Result<Option<Beer>> {
    Ok(beer::table
        .find(beer_id)
        .filter(beer::event_id.eq(event_id))
        .select(Beer::as_select())
        .first(conn)
        .optional()?)
}

/*************************************/
/** Create Beer message             **/
/*************************************/

/// Adds a beer to an event and registers each of its breweries.
/// Yields `None` when the event does not exist.
pub struct CreateBeer {
    pub event_id: i32,
    pub name: String,
    pub breweries: BreweryFields,
    pub style: String,
    pub abv: f64,
}

impl Query for CreateBeer {
    type Item = Option<Beer>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        conn.transaction::<_, Error, _>(|conn| {
            let event_exists: bool = diesel::select(diesel::dsl::exists(
                event::table.find(self.event_id),
            ))
            .get_result(conn)?;

            if !event_exists {
                return Ok(None);
            }

            let new_beer = NewBeer {
                event_id: self.event_id,
                name: &self.name,
                brewery: &self.breweries.brewery,
                breweries: &self.breweries.breweries,
                style: &self.style,
                abv: self.abv,
            };

            let created = diesel::insert_into(beer::table)
                .values(&new_beer)
                .returning(Beer::as_returning())
                .get_result(conn)?;

            for name in &self.breweries.breweries {
                upsert_brewery(conn, name)?;
            }

            Ok(Some(created))
        })
    }
}

/*************************************/
/** Update Beer message             **/
/*************************************/

pub struct UpdateBeer {
    pub event_id: i32,
    pub beer_id: i32,
    pub name: Option<String>,
    pub breweries: Option<BreweryFields>,
    pub style: Option<String>,
    pub abv: Option<f64>,
}

impl Query for UpdateBeer {
    type Item = Option<Beer>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        conn.transaction::<_, Error, _>(|conn| {
            let changes = BeerChanges {
                name: self.name.as_deref(),
                brewery: self.breweries.as_ref().map(|b| b.brewery.as_str()),
                breweries: self.breweries.as_ref().map(|b| b.breweries.as_slice()),
                style: self.style.as_deref(),
                abv: self.abv,
                updated_at: Utc::now(),
            };

            let updated = diesel::update(
                beer::table
                    .find(self.beer_id)
                    .filter(beer::event_id.eq(self.event_id)),
            )
            .set(&changes)
            .returning(Beer::as_returning())
            .get_result(conn)
            .optional()?;

            if let (Some(_), Some(fields)) = (&updated, &self.breweries) {
                for name in &fields.breweries {
                    upsert_brewery(conn, name)?;
                }
            }

            Ok(updated)
        })
    }
}

/*************************************/
/** Delete Beer message             **/
/*************************************/

/// Removes a beer and its reviews. Yields whether the beer existed.
pub struct DeleteBeer {
    pub event_id: i32,
    pub beer_id: i32,
}

impl Query for DeleteBeer {
    type Item = bool;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        conn.transaction::<_, Error, _>(|conn| {
            if find_beer(conn, self.event_id, self.beer_id)?.is_none() {
                return Ok(false);
            }

            diesel::delete(review::table.filter(review::beer_id.eq(self.beer_id))).execute(conn)?;
            diesel::delete(beer::table.find(self.beer_id)).execute(conn)?;

            Ok(true)
        })
    }
}
