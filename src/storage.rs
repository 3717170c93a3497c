//! SQLite-backed state for credential workflows.
//!
//! Two tables: `auth_kv`, a key-value row store holding the four credential
//! records, and `auth_failures`, an append-only ledger of failed login
//! attempts. Writes to `auth_kv` go through an explicit upsert so a key can
//! never have more than one row.
//!
//! Timestamps are persisted as fixed-width RFC 3339 UTC strings so the ledger
//! cutoff comparison can run inside SQL with plain string ordering. Cutoffs
//! are always computed in Rust from a caller-supplied clock, never from the
//! database's own clock.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use std::time::Duration;
use tracing::Instrument;

pub(crate) const KEY_PASSWORD_HASH: &str = "password_hash";
pub(crate) const KEY_RESET_EXPIRY: &str = "password_reset_expiry";
pub(crate) const KEY_LAST_RESET: &str = "password_last_reset";
pub(crate) const KEY_ADMIN_SESSION_EXPIRES: &str = "admin_session_expires";

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Open the device database and apply the embedded schema.
///
/// The pool is capped at a single connection: SQLite serializes writers
/// anyway, and one handle keeps every read-then-write workflow on the same
/// snapshot.
///
/// # Errors
/// Returns an error if the database cannot be opened or the schema fails to
/// apply.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

/// Apply the embedded schema to a caller-managed pool.
///
/// # Errors
/// Returns an error if any schema statement fails.
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Create or overwrite the row for `key`. Never duplicates.
pub(crate) async fn kv_upsert(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO auth_kv (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(key)
        .bind(value)
        .execute(&mut *conn)
        .instrument(span)
        .await?;
    Ok(())
}

pub(crate) async fn kv_get(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    let query = "SELECT value FROM auth_kv WHERE key = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(key)
        .fetch_optional(&mut *conn)
        .instrument(span)
        .await?;
    Ok(row.map(|row| row.get("value")))
}

/// Append one failed-attempt row. The ledger is never mutated or pruned here.
pub(crate) async fn append_failure(
    conn: &mut SqliteConnection,
    attempted_at: DateTime<Utc>,
    origin: &str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO auth_failures (attempted_at, origin) VALUES (?1, ?2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(format_timestamp(attempted_at))
        .bind(origin)
        .execute(&mut *conn)
        .instrument(span)
        .await?;
    Ok(())
}

/// Count failures strictly newer than `cutoff`.
pub(crate) async fn count_failures_since(
    conn: &mut SqliteConnection,
    cutoff: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let query = "SELECT COUNT(*) AS count FROM auth_failures WHERE attempted_at > ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(format_timestamp(cutoff))
        .fetch_one(&mut *conn)
        .instrument(span)
        .await?;
    Ok(row.get("count"))
}

/// Fixed-width RFC 3339 rendering; lexicographic order equals chronological.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. `None` on any malformed value; callers treat
/// that as "condition false".
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// `from + by`, saturating at the far end of representable time.
pub(crate) fn advance(from: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `from - by`, saturating at the near end of representable time.
pub(crate) fn rewind(from: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|delta| from.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
