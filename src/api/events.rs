use actix_web::{web, HttpResponse};
use chrono::naive::NaiveDate;
use chrono::DateTime;
use serde_derive::{Deserialize, Serialize};

use super::{created, success};
use crate::auth::SessionUser;
use crate::db::{
    self,
    events::{CreateEvent, DeleteEvent, GetEvent, ListEvents, UpdateEvent},
};
use crate::error::{Error, Result};
use crate::models::Event;
use crate::stats::{self, EventStats};
use crate::validation::non_blank;
use crate::AppState;

const EVENT_NOT_FOUND: &str = "Event not found";

#[derive(Deserialize)]
pub struct EventForm {
    /// Date of the event (yyyy-mm-dd). A full RFC 3339 timestamp is also accepted.
    pub date: Option<String>,
    pub title: Option<String>,
    /// Who picked the beers.
    pub chooser: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct EventWithStats {
    #[serde(flatten)]
    pub event: Event,

    #[serde(flatten)]
    pub stats: EventStats,
}

pub fn parse_event_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|d| d.date_naive()))
        .map_err(|_| Error::bad_request("Invalid date"))
}

/// Turns an optional text field into a column update: absent stays absent,
/// blank clears the column.
fn text_change(raw: &Option<String>) -> Option<Option<String>> {
    raw.as_deref().map(|s| non_blank(Some(s)).map(str::to_owned))
}

/// Route handler listing every event, newest first, with its stats.
pub async fn list(_user: SessionUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let listing = db::execute(&state.pool, ListEvents).await?;
    let mut stats = stats::stats_by_event(&listing.events, &listing.beers, &listing.reviews);

    let events: Vec<EventWithStats> = listing
        .events
        .into_iter()
        .map(|event| EventWithStats {
            stats: stats.remove(&event.id).unwrap_or_default(),
            event,
        })
        .collect();

    Ok(HttpResponse::Ok().json(events))
}

/// Route handler for creating new events
///
/// Expects the following JSON body:
///
/// - `date`: The date of the event (yyyy-mm-dd), required
/// - `title`: An optional title
/// - `chooser`: Optionally, who chose the beers
/// - `notes`: Optional free-form notes
pub async fn create(
    user: SessionUser,
    state: web::Data<AppState>,
    form: web::Json<EventForm>,
) -> Result<HttpResponse> {
    let date = match non_blank(form.date.as_deref()) {
        Some(raw) => parse_event_date(raw)?,
        None => return Err(Error::bad_request("Date is required")),
    };

    let event = db::execute(
        &state.pool,
        CreateEvent {
            title: non_blank(form.title.as_deref()).map(str::to_owned),
            date,
            chooser: non_blank(form.chooser.as_deref()).map(str::to_owned),
            notes: non_blank(form.notes.as_deref()).map(str::to_owned),
            created_by: user.email,
        },
    )
    .await?;

    info!("Event {} created", event.id);

    Ok(created(&event))
}

pub async fn get(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let event = db::execute(&state.pool, GetEvent { id: path.into_inner() })
        .await?
        .ok_or(Error::NotFound(EVENT_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(event))
}

/// Route handler applying the fields present in the body to an event.
pub async fn update(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<EventForm>,
) -> Result<HttpResponse> {
    let date = match non_blank(form.date.as_deref()) {
        Some(raw) => Some(parse_event_date(raw)?),
        None => None,
    };

    let event = db::execute(
        &state.pool,
        UpdateEvent {
            id: path.into_inner(),
            title: text_change(&form.title),
            date,
            chooser: text_change(&form.chooser),
            notes: text_change(&form.notes),
        },
    )
    .await?
    .ok_or(Error::NotFound(EVENT_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(event))
}

/// Route handler deleting an event along with its beers and reviews.
pub async fn delete(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let existed = db::execute(&state.pool, DeleteEvent { id }).await?;

    if existed {
        info!("Event {} deleted", id);
    }

    Ok(success())
}
