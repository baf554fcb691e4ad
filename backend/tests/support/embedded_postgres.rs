//! Database provisioning for embedded PostgreSQL tests.
//!
//! - Database reset uses `postgres` so `DROP DATABASE` never runs inside a
//!   Diesel transaction.
//! - Schema setup runs the crate's embedded Diesel migrations, so the tests
//!   exercise the same unique index names the store classifies.

use backend::domain::ports::UserIdentityStoreError;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};

use super::format_postgres_error;

/// Migrations from `backend/migrations`.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Drop and recreate `database` on `cluster`.
pub fn reset_database(
    cluster: &TestCluster,
    database: &str,
) -> Result<(), UserIdentityStoreError> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client = Client::connect(&admin_url, NoTls)
        .map_err(|err| UserIdentityStoreError::connection(format_postgres_error(&err)))?;
    // Separate statements: DROP DATABASE cannot run in an implicit transaction.
    for statement in [
        format!("DROP DATABASE IF EXISTS \"{database}\" WITH (FORCE)"),
        format!("CREATE DATABASE \"{database}\""),
    ] {
        client
            .batch_execute(&statement)
            .map_err(|err| UserIdentityStoreError::query(format_postgres_error(&err)))?;
    }
    Ok(())
}

/// Run all pending Diesel migrations against `url`.
pub fn migrate_schema(url: &str) -> Result<(), UserIdentityStoreError> {
    let mut conn = PgConnection::establish(url)
        .map_err(|err| UserIdentityStoreError::connection(format!("{err:?}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| UserIdentityStoreError::query(format!("migration: {err:?}")))?;
    Ok(())
}
