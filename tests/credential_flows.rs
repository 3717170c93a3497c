//! End-to-end credential workflows on an in-memory store.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use custode::{
    CredentialConfig, CredentialService, PASSWORD_OVERRIDE_ENV, ResetOutcome, Severity,
    StaticNetworkIdentity, storage,
};
use std::sync::Arc;
use std::time::Duration;

const WIRED_MAC: &str = "a0:b1:c2:d3:e4:f5";
const WIRELESS_MAC: &str = "11:22:33:44:55:66";
const WIRED_DEFAULT: &str = "a0b1c2d3e4f5";
const WIRELESS_DEFAULT: &str = "112233445566";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn service_with(config: CredentialConfig) -> Result<CredentialService> {
    init_tracing();
    let pool = storage::connect("sqlite::memory:").await?;
    let identity = Arc::new(StaticNetworkIdentity::new(Some(WIRED_MAC), Some(WIRELESS_MAC)));
    Ok(CredentialService::new(pool, config, identity))
}

async fn service() -> Result<CredentialService> {
    service_with(CredentialConfig::new()).await
}

#[tokio::test]
async fn provisions_wired_default_password() -> Result<()> {
    let service = service().await?;
    assert!(service.check_password(WIRED_DEFAULT).await?);
    assert!(!service.check_password("wrong-password").await?);
    Ok(())
}

#[tokio::test]
async fn falls_back_to_wireless_identifier() -> Result<()> {
    let pool = storage::connect("sqlite::memory:").await?;
    let identity = Arc::new(StaticNetworkIdentity::new(None, Some(WIRELESS_MAC)));
    let service = CredentialService::new(pool, CredentialConfig::new(), identity);

    assert!(service.check_password(WIRELESS_DEFAULT).await?);
    Ok(())
}

#[tokio::test]
async fn provisioning_is_idempotent() -> Result<()> {
    let service = service().await?;
    let first = service.get_or_provision_current_hash().await?;
    let second = service.get_or_provision_current_hash().await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn change_password_happy_path() -> Result<()> {
    let service = service().await?;

    let result = service
        .change_password(WIRED_DEFAULT, "NewPass2@", "NewPass2@")
        .await?;
    assert!(!result.error);
    assert_eq!(result.severity, Severity::Green);
    assert_eq!(result.message, "Password updated successfully.");

    assert!(service.check_password("NewPass2@").await?);
    assert!(!service.check_password(WIRED_DEFAULT).await?);
    Ok(())
}

#[tokio::test]
async fn mismatched_confirmation_leaves_hash_unchanged() -> Result<()> {
    let service = service().await?;

    let result = service
        .change_password(WIRED_DEFAULT, "A1!aaaaa", "B1!aaaaa")
        .await?;
    assert!(result.error);
    assert_eq!(result.severity, Severity::Red);
    assert_eq!(
        result.message,
        "New password and password confirmation do not match."
    );

    assert!(service.check_password(WIRED_DEFAULT).await?);
    assert!(!service.check_password("A1!aaaaa").await?);
    Ok(())
}

#[tokio::test]
async fn weak_new_password_is_rejected_without_mutation() -> Result<()> {
    let service = service().await?;

    let result = service.change_password(WIRED_DEFAULT, "short", "short").await?;
    assert!(result.error);
    assert!(result.message.contains("not complex enough"));

    assert!(service.check_password(WIRED_DEFAULT).await?);
    Ok(())
}

#[tokio::test]
async fn last_failing_check_message_wins() -> Result<()> {
    let service = service().await?;

    // Wrong current password and a weak new password: the complexity
    // message overwrites the current-password one.
    let result = service.change_password("wrong", "short", "short").await?;
    assert!(result.error);
    assert!(result.message.contains("not complex enough"));

    // Wrong current password alone reports the current-password failure.
    let result = service
        .change_password("wrong", "NewPass2@", "NewPass2@")
        .await?;
    assert!(result.error);
    assert_eq!(result.message, "Current password is not valid.");

    assert!(service.check_password(WIRED_DEFAULT).await?);
    Ok(())
}

#[tokio::test]
async fn reset_window_opens_and_expires() -> Result<()> {
    let service = service().await?;
    let opened_at = base_time();

    assert_eq!(
        service.try_consume_reset(opened_at).await?,
        ResetOutcome::NeverOpened
    );

    service.request_reset(opened_at).await?;
    assert!(
        service
            .is_reset_window_open(opened_at + chrono::Duration::seconds(30))
            .await
    );
    assert!(
        !service
            .is_reset_window_open(opened_at + chrono::Duration::seconds(61))
            .await
    );
    assert_eq!(
        service
            .try_consume_reset(opened_at + chrono::Duration::seconds(61))
            .await?,
        ResetOutcome::Expired
    );
    Ok(())
}

#[tokio::test]
async fn reset_restores_device_default() -> Result<()> {
    let service = service().await?;
    let opened_at = base_time();

    let result = service
        .change_password(WIRED_DEFAULT, "NewPass2@", "NewPass2@")
        .await?;
    assert!(!result.error);

    service.request_reset(opened_at).await?;
    let redeemed_at = opened_at + chrono::Duration::seconds(30);
    assert_eq!(
        service.try_consume_reset(redeemed_at).await?,
        ResetOutcome::Redeemed
    );

    assert!(service.check_password(WIRED_DEFAULT).await?);
    assert!(!service.check_password("NewPass2@").await?);

    assert!(
        service
            .was_reset_within(redeemed_at + chrono::Duration::seconds(30))
            .await
    );
    assert!(
        !service
            .was_reset_within(redeemed_at + chrono::Duration::seconds(90))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn redeeming_twice_within_window_succeeds() -> Result<()> {
    let service = service().await?;
    let opened_at = base_time();

    service.request_reset(opened_at).await?;
    assert_eq!(
        service
            .try_consume_reset(opened_at + chrono::Duration::seconds(10))
            .await?,
        ResetOutcome::Redeemed
    );
    // The window is not closed by redemption; it stays consumable until it
    // lapses on its own.
    assert_eq!(
        service
            .try_consume_reset(opened_at + chrono::Duration::seconds(40))
            .await?,
        ResetOutcome::Redeemed
    );
    assert_eq!(
        service
            .try_consume_reset(opened_at + chrono::Duration::seconds(61))
            .await?,
        ResetOutcome::Expired
    );
    Ok(())
}

#[tokio::test]
async fn failure_ledger_counts_only_recent_attempts() -> Result<()> {
    let service = service().await?;
    let now = base_time();

    service
        .record_failed_attempt("10.0.0.1", now - chrono::Duration::minutes(1))
        .await?;
    service
        .record_failed_attempt("10.0.0.2", now - chrono::Duration::minutes(9))
        .await?;
    service
        .record_failed_attempt("10.0.0.3", now - chrono::Duration::minutes(11))
        .await?;

    assert_eq!(service.count_recent_failures(now).await?, 2);
    Ok(())
}

#[tokio::test]
async fn admin_session_gate_respects_expiry() -> Result<()> {
    let service = service().await?;
    let now = base_time();

    assert!(!service.can_spawn_admin_session(now).await);

    service
        .extend_admin_session(now, Duration::from_secs(300))
        .await?;
    assert!(
        service
            .can_spawn_admin_session(now + chrono::Duration::seconds(299))
            .await
    );
    assert!(
        !service
            .can_spawn_admin_session(now + chrono::Duration::seconds(300))
            .await
    );
    Ok(())
}

#[tokio::test]
async fn operator_override_replaces_stored_password() -> Result<()> {
    let config = temp_env::with_var(
        PASSWORD_OVERRIDE_ENV,
        Some("Hunter2!pass"),
        CredentialConfig::from_env,
    );
    let service = service_with(config).await?;

    assert!(service.check_password("Hunter2!pass").await?);
    assert!(!service.check_password(WIRED_DEFAULT).await?);
    Ok(())
}

#[tokio::test]
async fn false_sentinel_means_no_override() -> Result<()> {
    let config = temp_env::with_var(
        PASSWORD_OVERRIDE_ENV,
        Some("false"),
        CredentialConfig::from_env,
    );
    let service = service_with(config).await?;

    assert!(service.check_password(WIRED_DEFAULT).await?);
    assert!(!service.check_password("false").await?);
    Ok(())
}
