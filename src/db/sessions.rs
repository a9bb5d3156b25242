use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::Query;
use crate::error::Result;
use crate::models::{LoginSession, NewLoginSession};
use crate::schema::login_session;

/********************************/
/** Create Login Session       **/
/********************************/

/// Stores a new session. Sessions that have already expired are removed
/// in the same pass.
pub struct CreateSession {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Query for CreateSession {
    type Item = LoginSession;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        let purged = purge_expired(conn)?;
        if purged > 0 {
            debug!("Purged {} expired session(s)", purged);
        }

        let new_session = NewLoginSession {
            id: &self.id,
            email: &self.email,
            name: &self.name,
            image: self.image.as_deref(),
            expires_at: self.expires_at,
        };

        Ok(diesel::insert_into(login_session::table)
            .values(&new_session)
            .returning(LoginSession::as_returning())
            .get_result(conn)?)
    }
}

/********************************/
/** Get Logged-in Session      **/
/********************************/

/// Looks up a session by its token, ignoring expired ones.
#[derive(Clone)]
pub struct GetActiveSession {
    pub session_id: String,
}

impl GetActiveSession {
    pub fn from_session(session_id: String) -> GetActiveSession {
        GetActiveSession { session_id }
    }
}

impl Query for GetActiveSession {
    type Item = Option<LoginSession>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(login_session::table
            .find(&self.session_id)
            .filter(login_session::expires_at.gt(Utc::now()))
            .select(LoginSession::as_select())
            .first(conn)
            .optional()?)
    }
}

pub struct DeleteSession {
    pub session_id: String,
}

impl Query for DeleteSession {
    type Item = usize;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(diesel::delete(login_session::table.find(&self.session_id)).execute(conn)?)
    }
}

pub struct PurgeExpiredSessions;

impl Query for PurgeExpiredSessions {
    type Item = usize;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        purge_expired(conn)
    }
}

fn purge_expired(conn: &mut PgConnection) -> Result<usize> {
    Ok(
        diesel::delete(login_session::table.filter(login_session::expires_at.le(Utc::now())))
            .execute(conn)?,
    )
}
