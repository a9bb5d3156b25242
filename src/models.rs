use chrono::naive::NaiveDate;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_derive::Serialize;

use super::schema::*;

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = event)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub title: Option<String>,
    pub date: NaiveDate,
    pub chooser: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = event)]
pub struct NewEvent<'a> {
    pub title: Option<&'a str>,
    pub date: NaiveDate,
    pub chooser: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_by: &'a str,
}

/// Partial update of an event. `None` leaves a column untouched,
/// `Some(None)` clears a nullable column.
#[derive(AsChangeset)]
#[diesel(table_name = event)]
pub struct EventChanges<'a> {
    pub title: Option<Option<&'a str>>,
    pub date: Option<NaiveDate>,
    pub chooser: Option<Option<&'a str>>,
    pub notes: Option<Option<&'a str>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = beer)]
#[serde(rename_all = "camelCase")]
pub struct Beer {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    /// Single brewery name kept for older rows; derived from `breweries` on write.
    pub brewery: String,
    pub breweries: Vec<String>,
    pub style: String,
    pub abv: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = beer)]
pub struct NewBeer<'a> {
    pub event_id: i32,
    pub name: &'a str,
    pub brewery: &'a str,
    pub breweries: &'a [String],
    pub style: &'a str,
    pub abv: f64,
}

#[derive(AsChangeset)]
#[diesel(table_name = beer)]
pub struct BeerChanges<'a> {
    pub name: Option<&'a str>,
    pub brewery: Option<&'a str>,
    pub breweries: Option<&'a [String]>,
    pub style: Option<&'a str>,
    pub abv: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = review)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub beer_id: i32,
    pub event_id: i32,
    pub user_email: String,
    pub user_name: String,
    pub rating: i16,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = review)]
pub struct NewReview<'a> {
    pub beer_id: i32,
    pub event_id: i32,
    pub user_email: &'a str,
    pub user_name: &'a str,
    pub rating: i16,
    pub description: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = review)]
pub struct ReviewChanges<'a> {
    pub rating: Option<i16>,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = brewery)]
#[serde(rename_all = "camelCase")]
pub struct Brewery {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = brewery)]
pub struct NewBrewery<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = whitelisted_email)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedEmail {
    pub id: i32,
    pub email: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = whitelisted_email)]
pub struct NewWhitelistedEmail<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = login_session)]
pub struct LoginSession {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = login_session)]
pub struct NewLoginSession<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub image: Option<&'a str>,
    pub expires_at: DateTime<Utc>,
}
