//! Network identity seam and device-default password derivation.
//!
//! Discovering hardware identifiers is the host's job; this crate only
//! consumes a wired-then-wireless fallback to derive the deterministic
//! default credential used for provisioning and reset redemption.

use anyhow::Result;

use crate::error::CredentialError;

/// MAC-like identifier strings per interface class.
#[derive(Debug, Clone, Default)]
pub struct InterfaceAddresses {
    pub wired: Option<String>,
    pub wireless: Option<String>,
}

/// Supplies the device's hardware network identifiers.
pub trait NetworkIdentitySource: Send + Sync {
    /// Current interface addresses. Implementations may consult sysfs, a
    /// management daemon, or fixed configuration.
    fn interface_addresses(&self) -> Result<InterfaceAddresses>;
}

/// Identity source with fixed addresses, for hosts with static configuration
/// and for tests.
#[derive(Debug, Clone)]
pub struct StaticNetworkIdentity {
    addresses: InterfaceAddresses,
}

impl StaticNetworkIdentity {
    #[must_use]
    pub fn new(wired: Option<&str>, wireless: Option<&str>) -> Self {
        Self {
            addresses: InterfaceAddresses {
                wired: wired.map(ToString::to_string),
                wireless: wireless.map(ToString::to_string),
            },
        }
    }
}

impl NetworkIdentitySource for StaticNetworkIdentity {
    fn interface_addresses(&self) -> Result<InterfaceAddresses> {
        Ok(self.addresses.clone())
    }
}

/// Derive the device-default password: the wired identifier with separators
/// stripped, falling back to the wireless one.
pub(crate) fn derive_default_password(
    source: &dyn NetworkIdentitySource,
) -> Result<String, CredentialError> {
    let addresses = source
        .interface_addresses()
        .map_err(CredentialError::Identity)?;

    let mac = addresses
        .wired
        .filter(|mac| !mac.is_empty())
        .or_else(|| addresses.wireless.filter(|mac| !mac.is_empty()))
        .ok_or(CredentialError::MissingNetworkIdentity)?;

    Ok(mac.replace(':', ""))
}

#[cfg(test)]
mod tests {
    use super::{InterfaceAddresses, NetworkIdentitySource, StaticNetworkIdentity, derive_default_password};
    use crate::error::CredentialError;

    #[test]
    fn wired_identifier_is_preferred() {
        let source = StaticNetworkIdentity::new(Some("a0:b1:c2:d3:e4:f5"), Some("11:22:33:44:55:66"));
        assert_eq!(derive_default_password(&source).unwrap(), "a0b1c2d3e4f5");
    }

    #[test]
    fn wireless_is_the_fallback() {
        let source = StaticNetworkIdentity::new(None, Some("11:22:33:44:55:66"));
        assert_eq!(derive_default_password(&source).unwrap(), "112233445566");

        // An empty wired value counts as absent.
        let source = StaticNetworkIdentity::new(Some(""), Some("11:22:33:44:55:66"));
        assert_eq!(derive_default_password(&source).unwrap(), "112233445566");
    }

    #[test]
    fn no_identifier_is_an_error() {
        let source = StaticNetworkIdentity::new(None, None);
        assert!(matches!(
            derive_default_password(&source),
            Err(CredentialError::MissingNetworkIdentity)
        ));
    }

    #[test]
    fn source_failure_is_surfaced() {
        struct FailingSource;
        impl NetworkIdentitySource for FailingSource {
            fn interface_addresses(&self) -> anyhow::Result<InterfaceAddresses> {
                Err(anyhow::anyhow!("sysfs unavailable"))
            }
        }

        assert!(matches!(
            derive_default_password(&FailingSource),
            Err(CredentialError::Identity(_))
        ));
    }
}
