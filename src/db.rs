use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verify_code: String,
    pub verify_code_expiry: i64,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
    pub created_at: i64,

    // unique: id
    // unique: email
    // unique among verified: username
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub account_id: String,
    pub content: String,
    pub created_at: i64,

    // unique: id
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        verify_code TEXT NOT NULL,
        verify_code_expiry INTEGER NOT NULL,
        is_verified BOOLEAN NOT NULL DEFAULT FALSE,
        is_accepting_messages BOOLEAN NOT NULL DEFAULT TRUE,
        created_at INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS accounts_username ON accounts (username, is_verified)",
    r#"CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY NOT NULL,
        account_id TEXT NOT NULL REFERENCES accounts (id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS messages_account ON messages (account_id, created_at)",
];

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;

    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }
    info!("database schema ready");
    Ok(())
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// A verified account holding `username`, if any.
pub async fn find_verified(db_pool: &SqlitePool, username: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounts WHERE username=? AND is_verified=TRUE")
        .bind(username)
        .fetch_optional(db_pool)
        .await
}

/// The account a handle points at, preferring the verified owner.
pub async fn find_by_username(db_pool: &SqlitePool, username: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounts WHERE username=? ORDER BY is_verified DESC, created_at DESC LIMIT 1")
        .bind(username)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounts WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await
}

/// A private in-memory database, used by the test suites.
pub async fn in_memory() -> Result<SqlitePool, sqlx::Error> {
    // one connection, otherwise every connection gets its own in-memory database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    migrate(&db_pool).await?;
    Ok(db_pool)
}
