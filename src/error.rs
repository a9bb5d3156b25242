use actix_web::error::{BlockingError, ResponseError};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use diesel::r2d2;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use std::convert::From;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "Unauthorized")]
    Unauthorized,

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "{}", _0)]
    NotFound(&'static str),

    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Invalid configuration: {}", _0)]
    Config(String),

    #[display(fmt = "Migration failed: {}", _0)]
    Migration(String),

    #[display(fmt = "OAuth exchange failed: {}", _0)]
    OAuth(String),

    #[display(fmt = "HTTP client error: {}", _0)]
    HttpClientError(reqwest::Error),

    #[display(fmt = "Database error: {}", _0)]
    DieselError(DieselError),

    #[display(fmt = "Connection pool error: {}", _0)]
    PoolError(r2d2::PoolError),

    #[display(fmt = "Blocking task was canceled")]
    BlockingError(BlockingError),
}

impl Error {
    pub fn bad_request<S: Into<String>>(message: S) -> Error {
        Error::BadRequest(message.into())
    }

    /// True when the error comes from a unique index rejecting a duplicate row.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Error::DieselError(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClientError(e) => Some(e),
            Self::DieselError(e) => Some(e),
            Self::PoolError(e) => Some(e),
            Self::BlockingError(e) => Some(e),
            _ => None,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::OAuth(_) | Self::HttpClientError(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::Migration(_)
            | Self::DieselError(_)
            | Self::PoolError(_)
            | Self::BlockingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_client_error() {
            self.to_string()
        } else {
            error!("{}", self);
            "Internal server error".to_owned()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

impl From<DieselError> for Error {
    fn from(e: DieselError) -> Error {
        Error::DieselError(e)
    }
}

impl From<r2d2::PoolError> for Error {
    fn from(e: r2d2::PoolError) -> Error {
        Error::PoolError(e)
    }
}

impl From<BlockingError> for Error {
    fn from(e: BlockingError) -> Error {
        Error::BlockingError(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::HttpClientError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn client_errors_carry_their_message() {
        let response = Error::NotFound("Event not found").error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Event not found" }));
    }

    #[actix_rt::test]
    async fn server_errors_hide_details() {
        let response = Error::Config("DATABASE_URL must be set".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Internal server error" }));
    }

    #[test]
    fn unique_violations_are_detected() {
        struct Info;
        impl diesel::result::DatabaseErrorInformation for Info {
            fn message(&self) -> &str {
                "duplicate key value violates unique constraint"
            }
            fn details(&self) -> Option<&str> {
                None
            }
            fn hint(&self) -> Option<&str> {
                None
            }
            fn table_name(&self) -> Option<&str> {
                None
            }
            fn column_name(&self) -> Option<&str> {
                None
            }
            fn constraint_name(&self) -> Option<&str> {
                None
            }
            fn statement_position(&self) -> Option<i32> {
                None
            }
        }

        let err = Error::from(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info),
        ));
        assert!(err.is_unique_violation());
        assert!(!Error::from(DieselError::NotFound).is_unique_violation());
    }
}
