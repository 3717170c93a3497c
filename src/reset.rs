//! Reset window state machine.
//!
//! Two nullable timestamps in the key-value store drive every decision:
//! `password_reset_expiry` bounds when a reset may be redeemed, and
//! `password_last_reset` records the most recent successful redemption for
//! the post-reset cooldown signal.
//!
//! Redemption deliberately leaves `password_reset_expiry` in place: an open
//! window stays redeemable until its natural expiry. Absent or malformed
//! state never opens the window (fail closed).

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::time::Duration;
use tracing::error;

use crate::storage;

/// Outcome of attempting to redeem a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The window was open; the default credential has been restored.
    Redeemed,
    /// A window existed but its expiry has passed.
    Expired,
    /// No window record exists (or it could not be read as a timestamp).
    NeverOpened,
}

/// Where the window currently stands relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowState {
    Open,
    Expired,
    NeverOpened,
}

/// Open (or re-open) the reset window: `expiry = now + duration`.
pub(crate) async fn open_window(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    duration: Duration,
) -> Result<(), sqlx::Error> {
    let expiry = storage::advance(now, duration);
    storage::kv_upsert(
        conn,
        storage::KEY_RESET_EXPIRY,
        &storage::format_timestamp(expiry),
    )
    .await
}

/// Read-only window check. Absent or malformed expiry is `NeverOpened`.
pub(crate) async fn window_state(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<WindowState, sqlx::Error> {
    let Some(raw) = storage::kv_get(conn, storage::KEY_RESET_EXPIRY).await? else {
        return Ok(WindowState::NeverOpened);
    };
    match storage::parse_timestamp(&raw) {
        Some(expiry) if now < expiry => Ok(WindowState::Open),
        Some(_) => Ok(WindowState::Expired),
        None => {
            error!("stored reset expiry is not a valid timestamp; treating window as never opened");
            Ok(WindowState::NeverOpened)
        }
    }
}

pub(crate) async fn window_is_open(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    Ok(matches!(window_state(conn, now).await?, WindowState::Open))
}

/// Record a successful redemption. The expiry record is left untouched, so
/// the window remains consumable until it lapses.
pub(crate) async fn mark_redeemed(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    storage::kv_upsert(
        conn,
        storage::KEY_LAST_RESET,
        &storage::format_timestamp(now),
    )
    .await
}

/// True iff the last successful reset happened less than `cooldown` ago.
///
/// Fully fail-closed: absent record, malformed timestamp, or a storage
/// failure all read as `false`.
pub(crate) async fn was_reset_within(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    let raw = match storage::kv_get(conn, storage::KEY_LAST_RESET).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return false,
        Err(err) => {
            error!("failed to read last reset timestamp: {err}");
            return false;
        }
    };
    let Some(last_reset) = storage::parse_timestamp(&raw) else {
        error!("stored last reset is not a valid timestamp; treating as never reset");
        return false;
    };
    match chrono::Duration::from_std(cooldown) {
        Ok(cooldown) => now.signed_duration_since(last_reset) < cooldown,
        Err(_) => true,
    }
}
