//! Admin session expiry gate.
//!
//! This module only gates: elevated authentication (an external collaborator)
//! extends `admin_session_expires`, and [`can_spawn`] answers whether a new
//! elevated session may start. A caller cannot distinguish "denied" from
//! "state absent"; both are `false` by design.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::time::Duration;
use tracing::error;

use crate::storage;

/// True iff an unexpired `admin_session_expires` record exists.
///
/// Fully fail-closed: absent record, malformed timestamp, or a storage
/// failure all read as `false`.
pub(crate) async fn can_spawn(conn: &mut SqliteConnection, now: DateTime<Utc>) -> bool {
    let raw = match storage::kv_get(conn, storage::KEY_ADMIN_SESSION_EXPIRES).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return false,
        Err(err) => {
            error!("failed to read admin session expiry: {err}");
            return false;
        }
    };
    match storage::parse_timestamp(&raw) {
        Some(expiry) => now < expiry,
        None => {
            error!("stored admin session expiry is not a valid timestamp; denying session");
            false
        }
    }
}

/// Push the admin session expiry to `now + ttl`.
pub(crate) async fn extend(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<(), sqlx::Error> {
    let expiry = storage::advance(now, ttl);
    storage::kv_upsert(
        conn,
        storage::KEY_ADMIN_SESSION_EXPIRES,
        &storage::format_timestamp(expiry),
    )
    .await
}
