//! Archive key material and the ways of obtaining it.

use std::fmt;

use tracing::debug;

use crate::error::{ConfigurationError, Result};

/// Environment variable consulted by [`EnvKeyProvider::default`]
pub const DEFAULT_KEY_VARIABLE: &str = "SNAPPAK_KEY";

/// Length of an archive key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// A 32 byte AES-256-GCM key
///
/// Keys are never written into an archive, and [`fmt::Debug`] does not print
/// the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveKey([u8; KEY_SIZE]);

impl ArchiveKey {
    /// Wrap raw key bytes
    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key written as 64 hex characters
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value.trim()).map_err(ConfigurationError::from)?;
        Self::try_from(bytes.as_slice())
    }

    /// The raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl TryFrom<&[u8]> for ArchiveKey {
    type Error = crate::error::Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = value
            .try_into()
            .map_err(|_| ConfigurationError::InvalidKeyLength(value.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArchiveKey(<redacted>)")
    }
}

/// Something that can hand out the key for opening encrypted entries
pub trait KeyProvider {
    /// Returns the archive key, or `None` when no key is configured
    fn archive_key(&self) -> Result<Option<ArchiveKey>>;
}

impl KeyProvider for ArchiveKey {
    fn archive_key(&self) -> Result<Option<ArchiveKey>> {
        Ok(Some(self.clone()))
    }
}

impl KeyProvider for Option<ArchiveKey> {
    fn archive_key(&self) -> Result<Option<ArchiveKey>> {
        Ok(self.clone())
    }
}

/// Reads a hex encoded key from an environment variable
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    variable: String,
}

impl EnvKeyProvider {
    /// Read the key from `variable`
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// The variable this provider reads
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_VARIABLE)
    }
}

impl KeyProvider for EnvKeyProvider {
    fn archive_key(&self) -> Result<Option<ArchiveKey>> {
        match std::env::var(&self.variable) {
            Ok(value) if !value.trim().is_empty() => {
                debug!(variable = %self.variable, "using archive key from environment");
                ArchiveKey::from_hex(&value).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{ArchiveKey, EnvKeyProvider, KeyProvider};
    use crate::error::{ConfigurationError, Error};

    const HEX_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn parse_hex_key() -> crate::error::Result<()> {
        let key = ArchiveKey::from_hex(HEX_KEY)?;
        assert_eq!(key.as_bytes()[0], 0x00);
        assert_eq!(key.as_bytes()[31], 0x1F);
        Ok(())
    }

    #[test]
    fn reject_short_key() {
        let result = ArchiveKey::from_hex("0011");
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::InvalidKeyLength(2)))
        ));
    }

    #[test]
    fn reject_non_hex_key() {
        let result = ArchiveKey::from_hex("zz");
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::InvalidKeyEncoding(_)))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let key = ArchiveKey::new([0xAB; 32]);
        assert_eq!(format!("{key:?}"), "ArchiveKey(<redacted>)");
    }

    #[test]
    fn env_provider_reads_variable() -> crate::error::Result<()> {
        let provider = EnvKeyProvider::new("SNAP_PAK_TEST_ENV_PROVIDER_KEY");
        std::env::remove_var(provider.variable());
        assert!(provider.archive_key()?.is_none());

        std::env::set_var(provider.variable(), HEX_KEY);
        let key = provider.archive_key()?;
        std::env::remove_var(provider.variable());

        assert_eq!(key, Some(ArchiveKey::from_hex(HEX_KEY)?));
        Ok(())
    }

    #[test]
    fn env_provider_rejects_bad_key() {
        let provider = EnvKeyProvider::new("SNAP_PAK_TEST_ENV_PROVIDER_BAD_KEY");
        std::env::set_var(provider.variable(), "abcd");
        let result = provider.archive_key();
        std::env::remove_var(provider.variable());

        assert!(result.is_err());
    }
}
