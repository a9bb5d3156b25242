use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use super::error::{Error, Result};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Longest accepted session lifetime, ten years.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// Runtime settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub pool_size: u32,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Identity provider endpoints. Default to Google's.
    pub oauth_auth_url: String,
    pub oauth_token_url: String,
    pub oauth_userinfo_url: String,
    pub public_url: String,
    pub session_ttl_days: i64,
    pub cors_origin: Option<String>,
    pub post_login_redirect: String,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ip: IpAddr = parse_or(&lookup, "LISTEN_IP", "127.0.0.1")?;
        let port: u16 = parse_or(&lookup, "PORT", "1234")?;

        let session_ttl_days: i64 = parse_or(&lookup, "SESSION_TTL_DAYS", "30")?;
        if session_ttl_days <= 0 || session_ttl_days > MAX_SESSION_TTL_DAYS {
            return Err(Error::Config(format!(
                "SESSION_TTL_DAYS must be between 1 and {}",
                MAX_SESSION_TTL_DAYS
            )));
        }

        let public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| "http://localhost:1234".to_owned())
            .trim_end_matches('/')
            .to_owned();

        Ok(Config {
            listen_addr: SocketAddr::new(ip, port),
            database_url: required(&lookup, "DATABASE_URL")?,
            pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", "10")?,
            google_client_id: required(&lookup, "GOOGLE_CLIENT_ID")?,
            google_client_secret: required(&lookup, "GOOGLE_CLIENT_SECRET")?,
            oauth_auth_url: lookup("OAUTH_AUTH_URL").unwrap_or_else(|| GOOGLE_AUTH_URL.to_owned()),
            oauth_token_url: lookup("OAUTH_TOKEN_URL").unwrap_or_else(|| GOOGLE_TOKEN_URL.to_owned()),
            oauth_userinfo_url: lookup("OAUTH_USERINFO_URL")
                .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_owned()),
            public_url,
            session_ttl_days,
            cors_origin: lookup("CORS_ORIGIN").filter(|origin| !origin.trim().is_empty()),
            post_login_redirect: lookup("POST_LOGIN_REDIRECT").unwrap_or_else(|| "/".to_owned()),
        })
    }

    pub fn oauth_redirect_url(&self) -> String {
        format!("{}/auth/callback", self.public_url)
    }

    /// Session and OAuth cookies are only marked `Secure` when served over https.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", key))),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{} not set, using default: {}", key, default);
        default.to_owned()
    });

    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("failed to parse ${}: {}", key, e)))
}
