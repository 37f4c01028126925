use std::env;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;

pub mod models;
pub mod schema;
pub mod seed;
pub mod store;

pub use store::{PizzaStore, StoreError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Used when `DB_URI` is not set: a file-backed database in the working directory.
pub const DEFAULT_DATABASE_URL: &str = "app.db";

pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Reads `DB_URI` (loading `.env` first), falling back to [`DEFAULT_DATABASE_URL`].
pub fn database_url_from_env() -> Result<String, StoreError> {
    dotenv().ok();

    let database_url = env::var("DB_URI").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    check_database_url(normalize_database_url(&database_url))
}

/// Every request opens its own connection, so an in-memory database would be
/// empty and unmigrated on each one.
pub fn check_database_url(database_url: String) -> Result<String, StoreError> {
    if database_url.is_empty()
        || database_url == ":memory:"
        || database_url.contains("mode=memory")
    {
        return Err(StoreError::UnsupportedDatabase(database_url));
    }
    Ok(database_url)
}

/// Accepts SQLAlchemy style `sqlite:///path` URLs as well as bare paths.
pub fn normalize_database_url(url: &str) -> String {
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .unwrap_or(url)
        .to_string()
}

pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, StoreError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    // SQLite leaves foreign key enforcement off for every new connection.
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
    Ok(conn)
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(())
}
