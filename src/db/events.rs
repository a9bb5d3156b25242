use chrono::naive::NaiveDate;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::Query;
use crate::error::{Error, Result};
use crate::models::{Beer, Event, EventChanges, NewEvent, Review};
use crate::schema::{beer, event, review};

/*************************************/
/** List Events query               **/
/*************************************/

/// Every event, newest first, along with the beers and reviews its stats need.
pub struct ListEvents;

pub struct EventListing {
    pub events: Vec<Event>,
    pub beers: Vec<Beer>,
    pub reviews: Vec<Review>,
}

impl Query for ListEvents {
    type Item = EventListing;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let events = event::table
            .order((event::date.desc(), event::id.desc()))
            .select(Event::as_select())
            .load(conn)?;

        let event_ids: Vec<i32> = events.iter().map(|e| e.id).collect();
        let beers = beer::table
            .filter(beer::event_id.eq_any(event_ids))
            .order(beer::id.asc())
            .select(Beer::as_select())
            .load(conn)?;

        let beer_ids: Vec<i32> = beers.iter().map(|b| b.id).collect();
        let reviews = review::table
            .filter(review::beer_id.eq_any(beer_ids))
            .select(Review::as_select())
            .load(conn)?;

        Ok(EventListing {
            events,
            beers,
            reviews,
        })
    }
}

/*************************************/
/** Get Event query                 **/
/*************************************/

pub struct GetEvent {
    pub id: i32,
}

impl Query for GetEvent {
    type Item = Option<Event>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(event::table
            .find(self.id)
            .select(Event::as_select())
            .first(conn)
            .optional()?)
    }
}

/*************************************/
/** Create Event message            **/
/*************************************/

pub struct CreateEvent {
    pub title: Option<String>,
    pub date: NaiveDate,
    pub chooser: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
}

impl Query for CreateEvent {
    type Item = Event;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let new_event = NewEvent {
            title: self.title.as_deref(),
            date: self.date,
            chooser: self.chooser.as_deref(),
            notes: self.notes.as_deref(),
            created_by: &self.created_by,
        };

        Ok(diesel::insert_into(event::table)
            .values(&new_event)
            .returning(Event::as_returning())
            .get_result(conn)?)
    }
}

/*************************************/
/** Update Event message            **/
/*************************************/

/// Outer `None` leaves a field as it is; `Some(None)` clears it.
pub struct UpdateEvent {
    pub id: i32,
    pub title: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub chooser: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl Query for UpdateEvent {
    type Item = Option<Event>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let changes = EventChanges {
            title: self.title.as_ref().map(|t| t.as_deref()),
            date: self.date,
            chooser: self.chooser.as_ref().map(|c| c.as_deref()),
            notes: self.notes.as_ref().map(|n| n.as_deref()),
            updated_at: Utc::now(),
        };

        Ok(diesel::update(event::table.find(self.id))
            .set(&changes)
            .returning(Event::as_returning())
            .get_result(conn)
            .optional()?)
    }
}

/*************************************/
/** Delete Event message            **/
/*************************************/

/// Removes the event with its beers and their reviews. Yields whether the
/// event existed.
pub struct DeleteEvent {
    pub id: i32,
}

impl Query for DeleteEvent {
    type Item = bool;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        conn.transaction::<_, Error, _>(|conn| {
            let beer_ids = beer::table
                .filter(beer::event_id.eq(self.id))
                .select(beer::id);

            let reviews = diesel::delete(review::table.filter(review::beer_id.eq_any(beer_ids)))
                .execute(conn)?;
            let beers = diesel::delete(beer::table.filter(beer::event_id.eq(self.id))).execute(conn)?;
            let events = diesel::delete(event::table.find(self.id)).execute(conn)?;

            debug!(
                "Deleted event {} ({} beers, {} reviews)",
                self.id, beers, reviews
            );

            Ok(events > 0)
        })
    }
}
