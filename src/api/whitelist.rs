use actix_web::{web, HttpResponse};
use serde_derive::Deserialize;

use super::{created, success};
use crate::auth::SessionUser;
use crate::db::{
    self,
    whitelist::{AddWhitelistedEmail, ListWhitelist, RemoveWhitelistedEmail},
};
use crate::error::{Error, Result};
use crate::validation::{non_blank, normalize_email, validate_email};
use crate::AppState;

#[derive(Deserialize)]
pub struct EmailForm {
    pub email: Option<String>,
}

pub async fn list(_user: SessionUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let emails = db::execute(&state.pool, ListWhitelist).await?;

    Ok(HttpResponse::Ok().json(emails))
}

/// Route handler allowing another email to sign in.
pub async fn add(
    user: SessionUser,
    state: web::Data<AppState>,
    form: web::Json<EmailForm>,
) -> Result<HttpResponse> {
    let email = validate_email(form.email.as_deref().unwrap_or_default())?;

    match db::execute(&state.pool, AddWhitelistedEmail { email }).await {
        Ok(entry) => {
            info!("{} whitelisted {}", user.email, entry.email);
            Ok(created(&entry))
        }
        Err(e) if e.is_unique_violation() => Err(Error::Conflict("Email already whitelisted".into())),
        Err(e) => Err(e),
    }
}

/// Route handler revoking an email, given as `?email=`.
pub async fn remove(
    user: SessionUser,
    state: web::Data<AppState>,
    params: web::Query<EmailForm>,
) -> Result<HttpResponse> {
    let email = non_blank(params.email.as_deref())
        .map(normalize_email)
        .ok_or_else(|| Error::bad_request("Email is required"))?;

    let removed = db::execute(&state.pool, RemoveWhitelistedEmail { email: email.clone() }).await?;
    if removed > 0 {
        info!("{} removed {} from the whitelist", user.email, email);
    }

    Ok(success())
}
