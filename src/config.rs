//! Credential workflow configuration.

use secrecy::SecretString;
use std::time::Duration;

/// Environment variable holding the operator password override.
pub const PASSWORD_OVERRIDE_ENV: &str = "PASSWORD_OVERRIDE";

/// Sentinel meaning "no override"; kept for compatibility with deployments
/// that always export the variable.
const OVERRIDE_DISABLED_SENTINEL: &str = "false";

const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_RESET_COOLDOWN: Duration = Duration::from_secs(60);
const DEFAULT_FAILURE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Durations and operator override for the credential workflows.
#[derive(Clone)]
pub struct CredentialConfig {
    reset_window: Duration,
    reset_cooldown: Duration,
    failure_window: Duration,
    password_override: Option<SecretString>,
}

impl CredentialConfig {
    /// Defaults: 1-minute reset window, 1-minute reset cooldown, 10-minute
    /// failure window, no override.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reset_window: DEFAULT_RESET_WINDOW,
            reset_cooldown: DEFAULT_RESET_COOLDOWN,
            failure_window: DEFAULT_FAILURE_WINDOW,
            password_override: None,
        }
    }

    /// Defaults plus the `PASSWORD_OVERRIDE` environment value, if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_password_override(std::env::var(PASSWORD_OVERRIDE_ENV).ok())
    }

    /// How long a triggered reset stays redeemable.
    #[must_use]
    pub const fn with_reset_window(mut self, window: Duration) -> Self {
        self.reset_window = window;
        self
    }

    /// How long after a successful reset callers can observe "just reset".
    #[must_use]
    pub const fn with_reset_cooldown(mut self, cooldown: Duration) -> Self {
        self.reset_cooldown = cooldown;
        self
    }

    /// How far back failed attempts count toward the lockout tally.
    #[must_use]
    pub const fn with_failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }

    /// Operator override password. `None` or the `"false"` sentinel disables
    /// it.
    #[must_use]
    pub fn with_password_override(mut self, value: Option<String>) -> Self {
        self.password_override = value
            .filter(|value| value != OVERRIDE_DISABLED_SENTINEL)
            .map(SecretString::from);
        self
    }

    #[must_use]
    pub const fn reset_window(&self) -> Duration {
        self.reset_window
    }

    #[must_use]
    pub const fn reset_cooldown(&self) -> Duration {
        self.reset_cooldown
    }

    #[must_use]
    pub const fn failure_window(&self) -> Duration {
        self.failure_window
    }

    #[must_use]
    pub fn password_override(&self) -> Option<&SecretString> {
        self.password_override.as_ref()
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("reset_window", &self.reset_window)
            .field("reset_cooldown", &self.reset_cooldown)
            .field("failure_window", &self.failure_window)
            .field(
                "password_override",
                &self.password_override.as_ref().map(|_| "***"),
            )
            .finish()
    }
}
