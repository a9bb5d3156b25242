use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::naive::NaiveDate;
use chrono::{DateTime, Utc};
use serde_derive::Serialize;

use crate::auth::SessionUser;
use crate::db::{
    self,
    reviews::{ListUserReviews, UserReviews},
};
use crate::error::Result;
use crate::models::{Beer, Event};
use crate::stats;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBeer {
    pub id: i32,
    pub name: String,
    pub brewery: String,
    pub breweries: Vec<String>,
    pub style: String,
    pub abv: f64,
}

impl From<&Beer> for ProfileBeer {
    fn from(beer: &Beer) -> ProfileBeer {
        ProfileBeer {
            id: beer.id,
            name: beer.name.clone(),
            brewery: beer.brewery.clone(),
            breweries: beer.breweries.clone(),
            style: beer.style.clone(),
            abv: beer.abv,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEvent {
    pub id: i32,
    /// The event title, falling back to its month and year.
    pub title: String,
    pub date: NaiveDate,
}

impl From<&Event> for ProfileEvent {
    fn from(event: &Event) -> ProfileEvent {
        ProfileEvent {
            id: event.id,
            title: stats::event_display_title(event),
            date: event.date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReview {
    pub id: i32,
    pub rating: i16,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub beer: Option<ProfileBeer>,
    pub event: Option<ProfileEvent>,
}

/// Pairs each review with its beer and event, keeping the order of the
/// reviews. A review whose beer or event is gone gets `null` there.
pub fn join_user_reviews(found: &UserReviews) -> Vec<ProfileReview> {
    let beers: HashMap<i32, &Beer> = found.beers.iter().map(|b| (b.id, b)).collect();
    let events: HashMap<i32, &Event> = found.events.iter().map(|e| (e.id, e)).collect();

    found
        .reviews
        .iter()
        .map(|review| ProfileReview {
            id: review.id,
            rating: review.rating,
            description: review.description.clone(),
            created_at: review.created_at,
            beer: beers.get(&review.beer_id).map(|&beer| ProfileBeer::from(beer)),
            event: events.get(&review.event_id).map(|&event| ProfileEvent::from(event)),
        })
        .collect()
}

/// Route handler listing the signed-in user's reviews, best rated first.
pub async fn reviews(user: SessionUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let found = db::execute(
        &state.pool,
        ListUserReviews {
            user_email: user.email,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(join_user_reviews(&found)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Review;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, day, 20, 0, 0).unwrap()
    }

    fn event(id: i32, title: Option<&str>) -> Event {
        Event {
            id,
            title: title.map(str::to_owned),
            date: NaiveDate::from_ymd_opt(2025, 2, 7).unwrap(),
            chooser: None,
            notes: None,
            created_by: "host@example.com".into(),
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn beer(id: i32, event_id: i32, name: &str) -> Beer {
        Beer {
            id,
            event_id,
            name: name.into(),
            brewery: "Half Acre".into(),
            breweries: vec!["Half Acre".into()],
            style: "IPA".into(),
            abv: 6.5,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn review(id: i32, beer_id: i32, event_id: i32, rating: i16) -> Review {
        Review {
            id,
            beer_id,
            event_id,
            user_email: "me@example.com".into(),
            user_name: "Me".into(),
            rating,
            description: String::new(),
            created_at: at(id as u32),
            updated_at: at(id as u32),
        }
    }

    #[test]
    fn reviews_are_joined_in_order() {
        let found = UserReviews {
            reviews: vec![review(2, 20, 1, 5), review(1, 10, 1, 3)],
            beers: vec![beer(10, 1, "Daisy Cutter"), beer(20, 1, "Gossamer")],
            events: vec![event(1, None)],
        };

        let joined = join_user_reviews(&found);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].id, 2);
        assert_eq!(joined[0].beer.as_ref().unwrap().name, "Gossamer");
        assert_eq!(joined[1].beer.as_ref().unwrap().name, "Daisy Cutter");
        assert_eq!(joined[0].event.as_ref().unwrap().title, "February 2025");
    }

    #[test]
    fn missing_beer_or_event_becomes_null() {
        let found = UserReviews {
            reviews: vec![review(1, 99, 7, 4)],
            beers: Vec::new(),
            events: vec![event(7, Some("Stout Night"))],
        };

        let joined = join_user_reviews(&found);

        assert!(joined[0].beer.is_none());
        assert_eq!(joined[0].event.as_ref().unwrap().title, "Stout Night");

        let body = serde_json::to_value(&joined[0]).unwrap();
        assert!(body["beer"].is_null());
        assert_eq!(body["rating"], 4);
        assert!(body.get("createdAt").is_some());
    }
}
