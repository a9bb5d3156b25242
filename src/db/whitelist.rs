use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::Query;
use crate::error::Result;
use crate::models::{NewWhitelistedEmail, WhitelistedEmail};
use crate::schema::whitelisted_email;

/// Whitelisted emails, most recently added first.
pub struct ListWhitelist;

impl Query for ListWhitelist {
    type Item = Vec<WhitelistedEmail>;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(whitelisted_email::table
            .order((whitelisted_email::added_at.desc(), whitelisted_email::id.desc()))
            .select(WhitelistedEmail::as_select())
            .load(conn)?)
    }
}

/// Fails with a unique violation when the email is already present.
/// `email` must already be normalized.
pub struct AddWhitelistedEmail {
    pub email: String,
}

impl Query for AddWhitelistedEmail {
    type Item = WhitelistedEmail;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(diesel::insert_into(whitelisted_email::table)
            .values(&NewWhitelistedEmail { email: &self.email })
            .returning(WhitelistedEmail::as_returning())
            .get_result(conn)?)
    }
}

pub struct RemoveWhitelistedEmail {
    pub email: String,
}

impl Query for RemoveWhitelistedEmail {
    type Item = usize;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(diesel::delete(whitelisted_email::table.filter(whitelisted_email::email.eq(&self.email)))
            .execute(conn)?)
    }
}

pub struct IsWhitelisted {
    pub email: String,
}

impl Query for IsWhitelisted {
    type Item = bool;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item> {
        Ok(diesel::select(exists(
            whitelisted_email::table.filter(whitelisted_email::email.eq(&self.email)),
        ))
        .get_result(conn)?)
    }
}
