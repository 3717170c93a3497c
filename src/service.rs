//! Credential workflows for the device admin password.
//!
//! [`CredentialService`] is the single entry point for the host's web layer.
//! Every mutating workflow runs as one transaction against the store: read
//! the current records, compute, write back, commit. The handle is released
//! on every exit path. Dependencies (pool, config, identity source) are
//! injected explicitly; there is no ambient request state.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::CredentialConfig;
use crate::error::CredentialResult;
use crate::hashing;
use crate::identity::{self, NetworkIdentitySource};
use crate::policy::PasswordPolicy;
use crate::reset::{self, ResetOutcome, WindowState};
use crate::session;
use crate::storage;

const MSG_CURRENT_INVALID: &str = "Current password is not valid.";
const MSG_CONFIRM_MISMATCH: &str = "New password and password confirmation do not match.";
const MSG_NOT_COMPLEX: &str = "Password is not complex enough, please ensure password is \
                               greater than 8 characters, has at least 1 number, 1 uppercase \
                               character and 1 special character.";
const MSG_UPDATED: &str = "Password updated successfully.";

/// Rendering hint for a password-change outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Red,
    Green,
}

/// Caller-visible outcome of a password change.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChangeResult {
    pub error: bool,
    pub message: String,
    pub severity: Severity,
}

/// Orchestrates password storage, verification, rotation, reset windows,
/// lockout accounting, and the admin-session gate.
pub struct CredentialService {
    pool: SqlitePool,
    config: CredentialConfig,
    identity: Arc<dyn NetworkIdentitySource>,
    policy: PasswordPolicy,
}

impl CredentialService {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        config: CredentialConfig,
        identity: Arc<dyn NetworkIdentitySource>,
    ) -> Self {
        Self {
            pool,
            config,
            identity,
            policy: PasswordPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Current password hash, provisioning one first if none is stored.
    ///
    /// With an operator override configured the override always wins and is
    /// re-persisted (fresh salt) on each call; otherwise a stored hash is
    /// returned as-is, and only a device with no password at all gets the
    /// derived default. The device is never left without a password.
    ///
    /// # Errors
    /// Fails on storage errors, hashing failures, or a missing network
    /// identity when the default must be derived.
    pub async fn get_or_provision_current_hash(&self) -> CredentialResult<String> {
        let mut tx = self.pool.begin().await?;
        let hash = self.provision_current_hash(&mut tx).await?;
        tx.commit().await?;
        Ok(hash)
    }

    /// Check a candidate against the current (possibly just-provisioned)
    /// password.
    ///
    /// # Errors
    /// Same failure modes as [`Self::get_or_provision_current_hash`].
    pub async fn check_password(&self, candidate: &str) -> CredentialResult<bool> {
        let hash = self.get_or_provision_current_hash().await?;
        Ok(hashing::verify_password(candidate, &hash))
    }

    /// Change the admin password.
    ///
    /// All three checks are evaluated, not short-circuited, so the message
    /// reflects the last failing condition when several fail. The new hash is
    /// written only when every check passes; any failure rolls the
    /// transaction back untouched.
    ///
    /// # Errors
    /// Fails on storage or hashing errors. Validation failures are not
    /// errors; they come back as a red [`PasswordChangeResult`].
    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> CredentialResult<PasswordChangeResult> {
        let mut tx = self.pool.begin().await?;
        let stored = self.provision_current_hash(&mut tx).await?;

        let mut failure: Option<&str> = None;
        if !hashing::verify_password(current, &stored) {
            failure = Some(MSG_CURRENT_INVALID);
        }
        if new != confirm {
            failure = Some(MSG_CONFIRM_MISMATCH);
        }
        if !self.policy.validate(new).is_empty() {
            failure = Some(MSG_NOT_COMPLEX);
        }

        if let Some(message) = failure {
            tx.rollback().await?;
            return Ok(PasswordChangeResult {
                error: true,
                message: message.to_string(),
                severity: Severity::Red,
            });
        }

        let hash = hashing::hash_password(new)?;
        storage::kv_upsert(&mut tx, storage::KEY_PASSWORD_HASH, &hash).await?;
        tx.commit().await?;
        info!("admin password updated");

        Ok(PasswordChangeResult {
            error: false,
            message: MSG_UPDATED.to_string(),
            severity: Severity::Green,
        })
    }

    /// Append a failed authentication attempt to the ledger.
    ///
    /// # Errors
    /// Fails if the store is unavailable.
    pub async fn record_failed_attempt(
        &self,
        origin: &str,
        now: DateTime<Utc>,
    ) -> CredentialResult<()> {
        let mut conn = self.pool.acquire().await?;
        storage::append_failure(&mut conn, now, origin).await?;
        Ok(())
    }

    /// Failed attempts strictly newer than `now - failure_window`.
    ///
    /// The lockout threshold itself is the caller's policy; this is a pure
    /// count.
    ///
    /// # Errors
    /// Fails if the store is unavailable.
    pub async fn count_recent_failures(&self, now: DateTime<Utc>) -> CredentialResult<i64> {
        let cutoff = storage::rewind(now, self.config.failure_window());
        let mut conn = self.pool.acquire().await?;
        Ok(storage::count_failures_since(&mut conn, cutoff).await?)
    }

    /// Open a reset window lasting `reset_window` from `now`.
    ///
    /// # Errors
    /// Fails if the store is unavailable.
    pub async fn request_reset(&self, now: DateTime<Utc>) -> CredentialResult<()> {
        let mut conn = self.pool.acquire().await?;
        reset::open_window(&mut conn, now, self.config.reset_window()).await?;
        info!("password reset window opened");
        Ok(())
    }

    /// Read-only reset window check. Fail-closed boolean.
    pub async fn is_reset_window_open(&self, now: DateTime<Utc>) -> bool {
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(err) => {
                error!("failed to acquire storage handle: {err}");
                return false;
            }
        };
        match reset::window_is_open(&mut conn, now).await {
            Ok(open) => open,
            Err(err) => {
                error!("failed to read reset window: {err}");
                false
            }
        }
    }

    /// Redeem the reset window if it is open.
    ///
    /// Redemption restores the deterministic device-default credential
    /// (caller-supplied passwords are never accepted here) and records
    /// `now` as the last reset. The window itself is left open until its
    /// natural expiry.
    ///
    /// # Errors
    /// Fails on storage errors, hashing failures, or a missing network
    /// identity.
    pub async fn try_consume_reset(&self, now: DateTime<Utc>) -> CredentialResult<ResetOutcome> {
        let mut tx = self.pool.begin().await?;
        match reset::window_state(&mut tx, now).await? {
            WindowState::NeverOpened => {
                tx.rollback().await?;
                Ok(ResetOutcome::NeverOpened)
            }
            WindowState::Expired => {
                tx.rollback().await?;
                Ok(ResetOutcome::Expired)
            }
            WindowState::Open => {
                let default_password = identity::derive_default_password(self.identity.as_ref())?;
                let hash = hashing::hash_password(&default_password)?;
                storage::kv_upsert(&mut tx, storage::KEY_PASSWORD_HASH, &hash).await?;
                reset::mark_redeemed(&mut tx, now).await?;
                tx.commit().await?;
                info!("password reset redeemed; device default restored");
                Ok(ResetOutcome::Redeemed)
            }
        }
    }

    /// True iff a successful reset happened less than `reset_cooldown` ago.
    /// Fail-closed boolean.
    pub async fn was_reset_within(&self, now: DateTime<Utc>) -> bool {
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(err) => {
                error!("failed to acquire storage handle: {err}");
                return false;
            }
        };
        reset::was_reset_within(&mut conn, now, self.config.reset_cooldown()).await
    }

    /// True iff an unexpired elevated-session expiry is on record.
    /// Fail-closed boolean.
    pub async fn can_spawn_admin_session(&self, now: DateTime<Utc>) -> bool {
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(err) => {
                error!("failed to acquire storage handle: {err}");
                return false;
            }
        };
        session::can_spawn(&mut conn, now).await
    }

    /// Push the admin session expiry to `now + ttl`. Called by the host after
    /// a successful elevated authentication.
    ///
    /// # Errors
    /// Fails if the store is unavailable.
    pub async fn extend_admin_session(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> CredentialResult<()> {
        let mut conn = self.pool.acquire().await?;
        session::extend(&mut conn, now, ttl).await?;
        Ok(())
    }

    async fn provision_current_hash(
        &self,
        conn: &mut SqliteConnection,
    ) -> CredentialResult<String> {
        if let Some(override_password) = self.config.password_override() {
            let hash = hashing::hash_password(override_password.expose_secret())?;
            storage::kv_upsert(conn, storage::KEY_PASSWORD_HASH, &hash).await?;
            info!("using password from override environment value");
            return Ok(hash);
        }

        if let Some(hash) = storage::kv_get(conn, storage::KEY_PASSWORD_HASH).await? {
            return Ok(hash);
        }

        let default_password = identity::derive_default_password(self.identity.as_ref())?;
        let hash = hashing::hash_password(&default_password)?;
        storage::kv_upsert(conn, storage::KEY_PASSWORD_HASH, &hash).await?;
        info!("no stored password; provisioning device default");
        Ok(hash)
    }
}
