use actix_web::web;
use diesel::pg::PgConnection;
use diesel::r2d2;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::error::{Error, Result};

pub mod beers;
pub mod breweries;
pub mod events;
pub mod reviews;
pub mod sessions;
pub mod whitelist;

pub type Pool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;
pub type Connection = r2d2::PooledConnection<r2d2::ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// Diesel does not have a `lower` function built in; create one ourselves.
define_sql_function!(fn lower(a: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// A single unit of database work, run on the blocking thread pool by [`execute`].
pub trait Query {
    type Item: Send + 'static;

    fn execute(&self, conn: &mut PgConnection) -> Result<Self::Item>;
}

pub async fn execute<T: Query + Send + 'static>(pool: &Pool, query: T) -> Result<T::Item> {
    let pool = pool.clone();

    web::block(move || {
        let mut conn: Connection = pool.get()?;
        query.execute(&mut conn)
    })
    .await?
}

/// Creates a pool without opening any connection up front.
pub fn build_pool(database_url: &str, max_size: u32) -> Pool {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(database_url);

    r2d2::Pool::builder()
        .max_size(max_size)
        .build_unchecked(manager)
}

/// Applies any migration that has not yet been run against the database.
pub fn run_migrations(pool: &Pool) -> Result<()> {
    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))?;

    for version in applied {
        info!("Applied migration {}", version);
    }

    Ok(())
}

/// Escapes `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100% Hops_Co"), "100\\% Hops\\_Co");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("Plain Brewing"), "Plain Brewing");
    }
}
