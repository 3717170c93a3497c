//! Error taxonomy for credential workflows.
//!
//! Only hard failures surface here. Policy violations and mismatched
//! confirmations are reported through [`crate::service::PasswordChangeResult`],
//! absent records are legitimate "no state yet" conditions, and malformed
//! stored timestamps collapse to a false gate (see the crate docs on the
//! fail-closed policy).

/// Hard failures from credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The underlying store is unavailable. No workflow can proceed without
    /// durable state; the caller decides whether to retry.
    #[error("credential storage is unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    /// The hashing primitive rejected its input or parameters.
    #[error("failed to hash password: {0}")]
    Hashing(String),

    /// Neither a wired nor a wireless identifier was available to derive the
    /// device-default credential.
    #[error("no network identifier available to derive the default credential")]
    MissingNetworkIdentity,

    /// The network identity source itself failed.
    #[error("network identity lookup failed: {0}")]
    Identity(anyhow::Error),
}

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;
