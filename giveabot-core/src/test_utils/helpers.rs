// File: giveabot-core/src/test_utils/helpers.rs
//
// Postgres helpers for environments that run the repository tests
// against a real database.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, Pool, Postgres};
use tracing::info;

use crate::Error;
use crate::db::Database;

/// Create the test database if it does not exist yet.
pub async fn ensure_test_database_exists() -> Result<(), Error> {
    let admin_url = std::env::var("DATABASE_ADMIN_URL")
        .unwrap_or_else(|_| "postgres://giveabot@localhost/postgres".to_string());

    let mut conn = PgConnection::connect(&admin_url).await?;
    let test_db = "giveabot_test";

    let create_db_sql = format!("CREATE DATABASE {test_db};");
    match sqlx::query(&create_db_sql).execute(&mut conn).await {
        Ok(_) => {
            info!("Created test DB '{test_db}'.");
        }
        Err(e) => {
            // 42P04 => duplicate_database
            let duplicate = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == "42P04")
                .unwrap_or(false);
            if duplicate {
                info!("Test DB '{test_db}' already exists; ignoring.");
            } else {
                return Err(Error::Database(e));
            }
        }
    }

    Ok(())
}

/// Connection pool to the test DB; honors `TEST_DATABASE_URL`.
pub async fn create_test_db_pool() -> Result<Pool<Postgres>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://giveabot@localhost/giveabot_test".to_string());

    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    Ok(pool)
}

/// Wipes test data so each test starts fresh.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            contest_entries,
            contests,
            guild_settings
        CASCADE
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Full setup: ensure the DB exists, connect, migrate, truncate.
pub async fn setup_test_database() -> Result<Database, Error> {
    ensure_test_database_exists().await?;
    let pool = create_test_db_pool().await?;
    let db = Database::from_pool(pool);
    db.migrate().await?;
    clean_database(db.pool()).await?;
    Ok(db)
}
