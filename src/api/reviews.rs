use actix_web::{web, HttpResponse};
use serde_derive::Deserialize;

use super::{created, success};
use crate::auth::SessionUser;
use crate::db::{
    self,
    reviews::{DeleteReview, GetReview, ListReviews, UpdateReview, UpsertReview},
};
use crate::error::{Error, Result};
use crate::models::Review;
use crate::validation::parse_rating;
use crate::AppState;

const BEER_NOT_FOUND: &str = "Beer not found";
const REVIEW_NOT_FOUND: &str = "Review not found";

#[derive(Deserialize)]
pub struct ReviewForm {
    /// Rating of the beer, 1 - 5.
    pub rating: Option<f64>,

    /// A comment/opinion about the beer.
    pub description: Option<String>,
}

pub async fn list(
    _user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (event_id, beer_id) = path.into_inner();
    let reviews = db::execute(&state.pool, ListReviews { event_id, beer_id })
        .await?
        .ok_or(Error::NotFound(BEER_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(reviews))
}

/// Route handler recording the signed-in user's review of a beer.
///
/// Each user holds at most one review per beer: posting again replaces the
/// earlier rating and description.
pub async fn create(
    user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
    form: web::Json<ReviewForm>,
) -> Result<HttpResponse> {
    let (event_id, beer_id) = path.into_inner();
    let rating = parse_rating(form.rating)?;

    let review = db::execute(
        &state.pool,
        UpsertReview {
            event_id,
            beer_id,
            user_email: user.email,
            user_name: user.name,
            rating,
            description: form.description.as_deref().unwrap_or_default().trim().to_owned(),
        },
    )
    .await?
    .ok_or(Error::NotFound(BEER_NOT_FOUND))?;

    Ok(created(&review))
}

/// Loads a review of a beer of the event and checks the signed-in user
/// wrote it.
async fn own_review(
    state: &AppState,
    user: &SessionUser,
    (event_id, beer_id, id): (i32, i32, i32),
    refusal: &'static str,
) -> Result<Review> {
    let review = db::execute(&state.pool, GetReview { event_id, beer_id, id })
        .await?
        .ok_or(Error::NotFound(REVIEW_NOT_FOUND))?;

    if review.user_email != user.email {
        return Err(Error::Forbidden(refusal));
    }

    Ok(review)
}

pub async fn update(
    user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32, i32)>,
    form: web::Json<ReviewForm>,
) -> Result<HttpResponse> {
    let review = own_review(&state, &user, path.into_inner(), "Can only edit your own reviews").await?;

    let rating = match form.rating {
        Some(rating) => Some(parse_rating(Some(rating))?),
        None => None,
    };

    let updated = db::execute(
        &state.pool,
        UpdateReview {
            id: review.id,
            rating,
            description: form.description.as_deref().map(|d| d.trim().to_owned()),
        },
    )
    .await?
    .ok_or(Error::NotFound(REVIEW_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete(
    user: SessionUser,
    state: web::Data<AppState>,
    path: web::Path<(i32, i32, i32)>,
) -> Result<HttpResponse> {
    let review = own_review(&state, &user, path.into_inner(), "Can only delete your own reviews").await?;
    db::execute(&state.pool, DeleteReview { id: review.id }).await?;

    Ok(success())
}
