//! # Custode (Device Admin Credential Authority)
//!
//! `custode` manages the credential lifecycle for a single-administrator
//! device: password storage, verification, rotation, a time-bounded
//! self-service reset, brute-force lockout accounting, and the elevated
//! admin-session gate. It lets an operator change or recover a device's
//! admin password without a network-connected identity provider.
//!
//! ## Workflows
//!
//! [`CredentialService`] is the sole entry point for the host's web layer.
//! Each workflow (change password, request/redeem a reset, failure
//! accounting) runs as one transaction against a SQLite-backed key-value
//! store, with all dependencies injected explicitly: pool, configuration,
//! and the network identity source.
//!
//! ## Default credential
//!
//! A device with no stored password is provisioned with a deterministic
//! default derived from a hardware network identifier (wired preferred,
//! wireless fallback, separators stripped). An operator override supplied
//! via the `PASSWORD_OVERRIDE` environment value replaces the derived
//! default unconditionally. Reset redemption always restores the derived
//! default; it never accepts caller-supplied input.
//!
//! ## Fail-closed time checks
//!
//! Every time-guarded decision (reset window open, post-reset cooldown,
//! admin-session gate) treats absent records, malformed timestamps, and
//! lookup failures as "condition false". A boolean `false` from a gate does
//! not distinguish "denied" from "no state"; both collapse by design, and
//! unknown state never grants access. All timestamps are stored and
//! compared in UTC from a caller-supplied trusted clock.

pub mod config;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod policy;
mod reset;
mod session;
pub mod service;
pub mod storage;

pub use config::{CredentialConfig, PASSWORD_OVERRIDE_ENV};
pub use error::{CredentialError, CredentialResult};
pub use identity::{InterfaceAddresses, NetworkIdentitySource, StaticNetworkIdentity};
pub use policy::{PasswordPolicy, PolicyViolation, SPECIAL_CHARACTERS};
pub use reset::ResetOutcome;
pub use service::{CredentialService, PasswordChangeResult, Severity};
