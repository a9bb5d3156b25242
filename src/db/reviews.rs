use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;

use super::beers::find_beer;
use super::Query;
use crate::error::{Error, Result};
use crate::models::{Beer, Event, NewReview, Review, ReviewChanges};
use crate::schema::{beer, event, review};

/*************************************/
/** List Reviews query              **/
/*************************************/

/// Reviews of one beer, newest first. Yields `None` when the beer is not
/// part of the event.
pub struct ListReviews {
    pub event_id: i32,
    pub beer_id: i32,
}

impl Query for ListReviews {
    type Item = Option<Vec<Review>>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        if find_beer(conn, self.event_id, self.beer_id)?.is_none() {
            return Ok(None);
        }

        let reviews = review::table
            .filter(review::beer_id.eq(self.beer_id))
            .order((review::created_at.desc(), review::id.desc()))
            .select(Review::as_select())
            .load(conn)?;

        Ok(Some(reviews))
    }
}

/*************************************/
/** Upsert Review message           **/
/*************************************/

/// Records a user's review of a beer, replacing the rating and text of any
/// earlier review by the same user. Yields `None` when the beer is not part
/// of the event.
pub struct UpsertReview {
    pub event_id: i32,
    pub beer_id: i32,
    pub user_email: String,
    pub user_name: String,
    pub rating: i16,
    pub description: String,
}

impl Query for UpsertReview {
    type Item = Option<Review>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        conn.transaction::<_, Error, _>(|conn| {
            if find_beer(conn, self.event_id, self.beer_id)?.is_none() {
                return Ok(None);
            }

            let new_review = NewReview {
                beer_id: self.beer_id,
                event_id: self.event_id,
                user_email: &self.user_email,
                user_name: &self.user_name,
                rating: self.rating,
                description: &self.description,
            };

            let saved = diesel::insert_into(review::table)
                .values(&new_review)
                .on_conflict((review::beer_id, review::user_email))
                .do_update()
                .set((
                    review::event_id.eq(excluded(review::event_id)),
                    review::user_name.eq(excluded(review::user_name)),
                    review::rating.eq(excluded(review::rating)),
                    review::description.eq(excluded(review::description)),
                    review::updated_at.eq(Utc::now()),
                ))
                .returning(Review::as_returning())
                .get_result(conn)?;

            Ok(Some(saved))
        })
    }
}

/*************************************/
/** Get Review query                **/
/*************************************/

/// A review of the given beer, where the beer is part of the given event.
pub struct GetReview {
    pub event_id: i32,
    pub beer_id: i32,
    pub id: i32,
}

impl Query for GetReview {
    type Item = Option<Review>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        if find_beer(conn, self.event_id, self.beer_id)?.is_none() {
            return Ok(None);
        }

        Ok(review::table
            .find(self.id)
            .filter(review::beer_id.eq(self.beer_id))
            .select(Review::as_select())
            .first(conn)
            .optional()?)
    }
}

/*************************************/
/** Update Review message           **/
/*************************************/

pub struct UpdateReview {
    pub id: i32,
    pub rating: Option<i16>,
    pub description: Option<String>,
}

impl Query for UpdateReview {
    type Item = Option<Review>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let changes = ReviewChanges {
            rating: self.rating,
            description: self.description.as_deref(),
            updated_at: Utc::now(),
        };

        Ok(diesel::update(review::table.find(self.id))
            .set(&changes)
            .returning(Review::as_returning())
            .get_result(conn)
            .optional()?)
    }
}

/*************************************/
/** Delete Review message           **/
/*************************************/

pub struct DeleteReview {
    pub id: i32,
}

impl Query for DeleteReview {
    type Item = usize;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(diesel::delete(review::table.find(self.id)).execute(conn)?)
    }
}

/*************************************/
/** List User Reviews query         **/
/*************************************/

/// A user's reviews, best rated first and newest first among equals, with
/// the beers and events they refer to.
pub struct ListUserReviews {
    pub user_email: String,
}

pub struct UserReviews {
    pub reviews: Vec<Review>,
    pub beers: Vec<Beer>,
    pub events: Vec<Event>,
}

impl Query for ListUserReviews {
    type Item = UserReviews;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let reviews = review::table
            .filter(review::user_email.eq(&self.user_email))
            .order((
                review::rating.desc(),
                review::created_at.desc(),
                review::id.desc(),
            ))
            .select(Review::as_select())
            .load(conn)?;

        if reviews.is_empty() {
            return Ok(UserReviews {
                reviews,
                beers: Vec::new(),
                events: Vec::new(),
            });
        }

        let beer_ids: Vec<i32> = reviews.iter().map(|r| r.beer_id).collect();
        let event_ids: Vec<i32> = reviews.iter().map(|r| r.event_id).collect();

        let beers = beer::table
            .filter(beer::id.eq_any(beer_ids))
            .select(Beer::as_select())
            .load(conn)?;
        let events = event::table
            .filter(event::id.eq_any(event_ids))
            .select(Event::as_select())
            .load(conn)?;

        Ok(UserReviews {
            reviews,
            beers,
            events,
        })
    }
}
