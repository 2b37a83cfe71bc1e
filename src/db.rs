use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Opens a connection pool against the SQLite database at [db_url], creating the
/// database file if it doesn't exist yet. Foreign key enforcement is switched on
/// for every connection because SQLite leaves it off unless asked.
pub async fn connect(db_url: &str) -> Result<SqlitePool, anyhow::Error> {
    let connect_options = SqliteConnectOptions::from_str(db_url)
        .context("parsing the database URL")?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(2))
        .connect_with(connect_options)
        .await
        .context("opening the database pool")
}

/// Creates the users and tasks tables if this is the first run against the
/// database. This is the only schema management the application performs.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), anyhow::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users ( \
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            name TEXT NOT NULL, \
            email TEXT UNIQUE NOT NULL, \
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')) \
        )",
    )
    .execute(pool)
    .await
    .context("creating the users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tasks ( \
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            user_id INTEGER NOT NULL, \
            title TEXT NOT NULL, \
            description TEXT, \
            status TEXT NOT NULL DEFAULT 'pending', \
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')), \
            FOREIGN KEY (user_id) REFERENCES users (id) \
        )",
    )
    .execute(pool)
    .await
    .context("creating the tasks table")?;

    Ok(())
}
