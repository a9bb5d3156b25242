//! Sign-in through Google, gated by the email whitelist.
//!
//! A successful sign-in stores a random session token in `login_session` and
//! hands it to the browser as an HTTP-only cookie. [`SessionUser`] resolves
//! that cookie on every protected request.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use futures::future::{FutureExt, LocalBoxFuture};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde_derive::{Deserialize, Serialize};
use serde_json::json;
use textnonce::TextNonce;

use super::config::Config;
use super::db::{
    self,
    sessions::{CreateSession, DeleteSession, GetActiveSession},
    whitelist::IsWhitelisted,
};
use super::error::{Error, Result};
use super::validation::normalize_email;
use super::AppState;

pub const SESSION_COOKIE: &str = "beer_night_session";
pub const STATE_COOKIE: &str = "beer_night_oauth_state";
pub const VERIFIER_COOKIE: &str = "beer_night_oauth_verifier";

/// Answer given for every refused sign-in.
pub const ACCESS_DENIED: &str = "AccessDenied";

const SESSION_TOKEN_LENGTH: usize = 32;
const OAUTH_COOKIE_MINUTES: i64 = 10;

/// Profile fields returned by the identity provider's userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct Profile {
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

pub struct AuthClient {
    oauth: BasicClient,
    http: reqwest::Client,
    userinfo_url: String,
}

impl AuthClient {
    pub fn new(config: &Config) -> Result<AuthClient> {
        let invalid_url = |e: oauth2::url::ParseError| Error::Config(format!("invalid OAuth URL: {}", e));

        let oauth = BasicClient::new(
            ClientId::new(config.google_client_id.clone()),
            Some(ClientSecret::new(config.google_client_secret.clone())),
            AuthUrl::new(config.oauth_auth_url.clone()).map_err(invalid_url)?,
            Some(TokenUrl::new(config.oauth_token_url.clone()).map_err(invalid_url)?),
        )
        .set_redirect_uri(RedirectUrl::new(config.oauth_redirect_url()).map_err(invalid_url)?);

        Ok(AuthClient {
            oauth,
            http: reqwest::Client::new(),
            userinfo_url: config.oauth_userinfo_url.clone(),
        })
    }

    /// Authorization URL plus the CSRF state and PKCE verifier the callback must present.
    pub fn authorize(&self) -> (String, String, String) {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_state) = self
            .oauth
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_owned()))
            .add_scope(Scope::new("email".to_owned()))
            .add_scope(Scope::new("profile".to_owned()))
            .set_pkce_challenge(challenge)
            .url();

        (
            url.to_string(),
            csrf_state.secret().clone(),
            verifier.secret().clone(),
        )
    }

    /// Trades the authorization code for a token and fetches the user's profile.
    pub async fn fetch_profile(&self, code: String, verifier: String) -> Result<Profile> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::OAuth(e.to_string()))?;

        let profile = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?
            .error_for_status()?
            .json::<Profile>()
            .await?;

        Ok(profile)
    }
}

/// The signed-in user, resolved from the session cookie.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

impl FromRequest for SessionUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<SessionUser>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session_id = req
            .cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty());
        let state = req.app_data::<web::Data<AppState>>().cloned();

        async move {
            let session_id = session_id.ok_or(Error::Unauthorized)?;
            let state = state.ok_or_else(|| Error::Config("application state is not registered".into()))?;

            let session = db::execute(&state.pool, GetActiveSession::from_session(session_id))
                .await?
                .ok_or(Error::Unauthorized)?;

            Ok::<_, Error>(SessionUser {
                email: session.email,
                name: session.name,
                image: session.image,
            })
        }
        .boxed_local()
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Route handler starting the sign-in flow.
pub async fn login(state: web::Data<AppState>) -> HttpResponse {
    let (url, csrf_state, verifier) = state.auth.authorize();
    let secure = state.config.secure_cookies();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, url))
        .cookie(oauth_cookie(STATE_COOKIE, csrf_state, secure))
        .cookie(oauth_cookie(VERIFIER_COOKIE, verifier, secure))
        .finish()
}

/// Route handler the identity provider redirects back to.
///
/// Only emails on the whitelist get a session; everyone else is refused with
/// [`ACCESS_DENIED`].
pub async fn callback(
    req: HttpRequest,
    params: web::Query<CallbackParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let params = params.into_inner();

    if let Some(error) = params.error {
        info!("Sign-in aborted by provider: {}", error);
        return Err(Error::Forbidden(ACCESS_DENIED));
    }

    let (code, returned_state) = match (params.code, params.state) {
        (Some(code), Some(returned_state)) => (code, returned_state),
        _ => return Err(Error::bad_request("Missing authorization code")),
    };

    let expected_state = req.cookie(STATE_COOKIE).map(|c| c.value().to_owned());
    let verifier = req.cookie(VERIFIER_COOKIE).map(|c| c.value().to_owned());

    let verifier = match (expected_state, verifier) {
        (Some(expected), Some(verifier)) if expected == returned_state => verifier,
        _ => {
            warn!("Rejected sign-in callback with a mismatched state");
            return Err(Error::bad_request("Invalid sign-in state"));
        }
    };

    let profile = state.auth.fetch_profile(code, verifier).await?;

    let email = match profile.email.as_deref().map(normalize_email) {
        Some(email) if !email.is_empty() && profile.email_verified != Some(false) => email,
        _ => {
            info!("Refused sign-in without a verified email");
            return Err(Error::Forbidden(ACCESS_DENIED));
        }
    };

    let whitelisted = match db::execute(&state.pool, IsWhitelisted { email: email.clone() }).await {
        Ok(whitelisted) => whitelisted,
        Err(e) => {
            error!("Whitelist check failed for {}: {}", email, e);
            return Err(Error::Forbidden(ACCESS_DENIED));
        }
    };
    info!("Whitelist check for email: {}, result: {}", email, whitelisted);

    if !whitelisted {
        return Err(Error::Forbidden(ACCESS_DENIED));
    }

    let ttl_days = state.config.session_ttl_days;
    let expires_at = Utc::now()
        .checked_add_signed(Duration::days(ttl_days))
        .ok_or_else(|| Error::Config("SESSION_TTL_DAYS is out of range".into()))?;
    let token = new_session_token()?;

    db::execute(
        &state.pool,
        CreateSession {
            id: token.clone(),
            email,
            name: profile.name.unwrap_or_default(),
            image: profile.picture,
            expires_at,
        },
    )
    .await?;

    let secure = state.config.secure_cookies();

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, state.config.post_login_redirect.clone()))
        .cookie(session_cookie(token, ttl_days, secure))
        .cookie(removal_cookie(STATE_COOKIE))
        .cookie(removal_cookie(VERIFIER_COOKIE))
        .finish())
}

/// Route handler ending the current session, if there is one.
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let removed = db::execute(
            &state.pool,
            DeleteSession {
                session_id: cookie.value().to_owned(),
            },
        )
        .await?;
        debug!("Removed {} session(s)", removed);
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(SESSION_COOKIE))
        .json(json!({ "success": true })))
}

pub async fn session(user: SessionUser) -> HttpResponse {
    HttpResponse::Ok().json(user)
}

fn new_session_token() -> Result<String> {
    TextNonce::sized_urlsafe(SESSION_TOKEN_LENGTH)
        .map(TextNonce::into_string)
        .map_err(|e| Error::Config(format!("cannot generate session token: {}", e)))
}

fn session_cookie(token: String, ttl_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(ttl_days))
        .finish()
}

fn oauth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/auth")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(OAUTH_COOKIE_MINUTES))
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let path = if name == SESSION_COOKIE { "/" } else { "/auth" };
    let mut cookie = Cookie::build(name, "").path(path).finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tokens_are_url_safe_and_unique() {
        let a = new_session_token().unwrap();
        let b = new_session_token().unwrap();
        assert_eq!(a.len(), SESSION_TOKEN_LENGTH);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("token".into(), 30, true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn removal_cookies_expire() {
        let cookie = removal_cookie(STATE_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
