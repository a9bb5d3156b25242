use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{escape_like, lower, Query};
use crate::error::Result;
use crate::models::{Beer, Brewery, Event, NewBrewery, Review};
use crate::schema::{beer, brewery, event, review};

/// Most suggestions returned for a search term.
pub const SEARCH_LIMIT: i64 = 20;

/*************************************/
/** Search Breweries query          **/
/*************************************/

/// Breweries sorted by name. With a term, only names containing it
/// (ignoring case), capped at [`SEARCH_LIMIT`].
pub struct SearchBreweries {
    pub term: Option<String>,
}

impl Query for SearchBreweries {
    type Item = Vec<Brewery>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let breweries = match &self.term {
            Some(term) => brewery::table
                .filter(brewery::name.ilike(format!("%{}%", escape_like(term))))
                .order(brewery::name.asc())
                .limit(SEARCH_LIMIT)
                .select(Brewery::as_select())
                .load(conn)?,
            None => brewery::table
                .order(brewery::name.asc())
                .select(Brewery::as_select())
                .load(conn)?,
        };

        Ok(breweries)
    }
}

/*************************************/
/** Upsert Brewery message          **/
/*************************************/

pub struct UpsertBrewery {
    pub name: String,
}

impl Query for UpsertBrewery {
    type Item = Brewery;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        upsert_brewery(conn, &self.name)
    }
}

/// Returns the brewery whose name matches `name` ignoring case, inserting
/// `name` as given when there is none.
pub(crate) fn upsert_brewery(conn: &mut PgConnection, name: &str) -> Result<Brewery> {
    if let Some(existing) = find_by_name(conn, name)? {
        return Ok(existing);
    }

    // The unique index on lower(name) turns a concurrent insert into a no-op.
    diesel::insert_into(brewery::table)
        .values(&NewBrewery { name })
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(brewery::table
        .filter(lower(brewery::name).eq(lower(name)))
        .select(Brewery::as_select())
        .first(conn)?)
}

fn find_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Brewery>> {
    Ok(brewery::table
        .filter(lower(brewery::name).eq(lower(name)))
        .select(Brewery::as_select())
        .first(conn)
        .optional()?)
}

/*************************************/
/** Brewery Directory query         **/
/*************************************/

/// Every beer in insertion order with the reviews and events needed to
/// build the brewery directory.
pub struct BreweryDirectory;

impl Query for BreweryDirectory {
    type Item = (Vec<Beer>, Vec<Review>, Vec<Event>);

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let beers = beer::table
            .order(beer::id.asc())
            .select(Beer::as_select())
            .load(conn)?;

        let reviews = review::table.select(Review::as_select()).load(conn)?;

        let mut event_ids: Vec<i32> = beers.iter().map(|b| b.event_id).collect();
        event_ids.sort_unstable();
        event_ids.dedup();

        let events = event::table
            .filter(event::id.eq_any(event_ids))
            .select(Event::as_select())
            .load(conn)?;

        Ok((beers, reviews, events))
    }
}
