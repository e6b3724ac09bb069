//! Storage gateway: pool setup, schema and row-level query helpers.
//!
//! Handlers never decode typed structs from the store. Every query returns
//! rows as ordered `serde_json::Value` sequences which the shaper in
//! [`crate::shape`] turns into JSON objects.

use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite, SqliteConnection, SqlitePool, TypeInfo, ValueRef,
};
use tracing::info;

use crate::config::{self, DatabaseConfig};

/// One result row, values in column order.
pub type Record = Vec<Value>;

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::Int(v)
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT
    )",
    "CREATE TABLE IF NOT EXISTS quizes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        level INTEGER,
        category_id INTEGER,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    )",
    "CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT,
        score INTEGER,
        quiz_id INTEGER,
        FOREIGN KEY(quiz_id) REFERENCES quizes(id)
    )",
    "CREATE TABLE IF NOT EXISTS options (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT,
        is_correct INTEGER,
        question_id INTEGER,
        FOREIGN KEY(question_id) REFERENCES questions(id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id)",
];

/// Creates the tables if they are missing. Idempotent.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Opens the pool for `cfg.url`, creating the database file if needed.
///
/// Every new pooled connection runs [`ensure_schema`] before it is handed
/// out, so a store deleted or swapped underneath a running process is
/// recreated on the next connect. Foreign keys stay declarative: references
/// to missing rows are accepted.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    config::ensure_sqlite_parent_dir(&cfg.url)?;

    let busy = Duration::from_millis(cfg.busy_timeout_ms);
    let options = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(true)
        .foreign_keys(false)
        .busy_timeout(busy);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(busy.max(Duration::from_secs(1)))
        .after_connect(|conn, _meta| Box::pin(async move { ensure_schema(conn).await }))
        .connect_with(options)
        .await?;

    info!("Connected to SQLite store at {}", cfg.url);
    Ok(pool)
}

/// Best-effort tuning plus schema creation, run once at startup.
pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }

    let mut conn = pool.acquire().await?;
    ensure_schema(&mut conn).await?;
    Ok(())
}

/// Liveness probe for the store.
pub async fn readiness(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ())
}

fn bind_all<'q>(sql: &'q str, args: &'q [SqlArg]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let mut q = sqlx::query(sql);
    for arg in args {
        q = match arg {
            SqlArg::Int(v) => q.bind(*v),
            SqlArg::Text(s) => q.bind(s.as_str()),
        };
    }
    q
}

fn decode_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut out = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            out.push(Value::Null);
            continue;
        }
        let kind = raw.type_info().name().to_string();
        let value = match kind.as_str() {
            "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(i)?),
            "REAL" | "NUMERIC" => serde_json::Number::from_f64(row.try_get::<f64, _>(i)?)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            "BLOB" => Value::String(String::from_utf8_lossy(&row.try_get::<Vec<u8>, _>(i)?).into_owned()),
            _ => Value::String(row.try_get::<String, _>(i)?),
        };
        out.push(value);
    }
    Ok(out)
}

/// Runs a SELECT and returns the first row, if any.
pub async fn query_one<'c, E>(exec: E, sql: &str, args: &[SqlArg]) -> Result<Option<Record>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = bind_all(sql, args).fetch_optional(exec).await?;
    row.as_ref().map(decode_row).transpose()
}

/// Runs a SELECT and returns all rows in store order.
pub async fn query_all<'c, E>(exec: E, sql: &str, args: &[SqlArg]) -> Result<Vec<Record>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = bind_all(sql, args).fetch_all(exec).await?;
    rows.iter().map(decode_row).collect()
}

/// Runs an INSERT and returns the id the store assigned to the new row.
pub async fn execute<'c, E>(exec: E, sql: &str, args: &[SqlArg]) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    Ok(bind_all(sql, args).execute(exec).await?.last_insert_rowid())
}
