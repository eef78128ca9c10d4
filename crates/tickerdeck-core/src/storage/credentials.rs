//! WiFi credentials persisted as `ssid, 0x00, password, 0x00` at the start
//! of a 512-byte region. No checksum, length prefix or version.

use alloc::string::String;
use alloc::vec;

use embedded_storage::Storage;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::config::CREDENTIAL_REGION_LEN;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credentials need {needed} bytes, region holds {capacity}")]
    TooLong { needed: usize, capacity: usize },
    #[error("credentials must not contain NUL bytes")]
    InteriorNul,
    #[error("SSID must not be empty")]
    EmptySsid,
    #[error("storage access failed")]
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: String::from(ssid),
            password: String::from(password),
        }
    }

    /// Bytes used in the region, terminators included.
    pub fn encoded_len(&self) -> usize {
        self.ssid.len() + self.password.len() + 2
    }

    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.ssid.is_empty() {
            return Err(CredentialError::EmptySsid);
        }
        if self.ssid.contains('\0') || self.password.contains('\0') {
            return Err(CredentialError::InteriorNul);
        }
        if self.encoded_len() > CREDENTIAL_REGION_LEN {
            return Err(CredentialError::TooLong {
                needed: self.encoded_len(),
                capacity: CREDENTIAL_REGION_LEN,
            });
        }
        Ok(())
    }
}

/// Credential region at `base` inside a [`Storage`] device.
pub struct CredentialStore<S> {
    storage: S,
    base: u32,
}

impl<S> CredentialStore<S>
where
    S: Storage,
    S::Error: core::fmt::Debug,
{
    pub fn new(storage: S, base: u32) -> Self {
        Self { storage, base }
    }

    /// Validate and write. Nothing is written when validation fails.
    pub fn save_wifi_credentials(&mut self, creds: &WifiCredentials) -> Result<(), CredentialError> {
        creds.validate()?;

        let mut encoded = vec![0u8; creds.encoded_len()];
        let ssid_len = creds.ssid.len();
        encoded[..ssid_len].copy_from_slice(creds.ssid.as_bytes());
        encoded[ssid_len + 1..ssid_len + 1 + creds.password.len()]
            .copy_from_slice(creds.password.as_bytes());

        self.storage.write(self.base, &encoded).map_err(|e| {
            warn!("Credential write failed: {:?}", e);
            CredentialError::Storage
        })?;
        info!("Saved WiFi credentials for '{}'", creds.ssid);
        Ok(())
    }

    /// Read the stored pair.
    ///
    /// `None` unless both strings are terminated inside the region, are
    /// valid UTF-8 and are non-empty.
    pub fn load_wifi_credentials(&mut self) -> Option<WifiCredentials> {
        let mut region = vec![0u8; CREDENTIAL_REGION_LEN];
        if let Err(e) = self.storage.read(self.base, &mut region) {
            warn!("Credential read failed: {:?}", e);
            return None;
        }

        let mut fields = region.splitn(3, |&b| b == 0);
        let ssid = fields.next()?;
        let password = fields.next()?;
        // A third piece exists only if the password was terminated
        fields.next()?;

        let ssid = core::str::from_utf8(ssid).ok()?;
        let password = core::str::from_utf8(password).ok()?;
        if ssid.is_empty() || password.is_empty() {
            debug!(" No stored WiFi credentials");
            return None;
        }
        Some(WifiCredentials::new(ssid, password))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> CredentialStore<MemoryStorage<CREDENTIAL_REGION_LEN>> {
        CredentialStore::new(MemoryStorage::new(), 0)
    }

    #[test]
    fn test_round_trip() {
        let mut store = store();
        store
            .save_wifi_credentials(&WifiCredentials::new("Net1", "Pass1"))
            .unwrap();
        assert_eq!(&store.storage().as_bytes()[..11], b"Net1\0Pass1\0");
        assert_eq!(
            store.load_wifi_credentials(),
            Some(WifiCredentials::new("Net1", "Pass1"))
        );
    }

    #[test]
    fn test_shorter_overwrite_wins() {
        let mut store = store();
        store
            .save_wifi_credentials(&WifiCredentials::new("LongNetworkName", "LongPassword"))
            .unwrap();
        store
            .save_wifi_credentials(&WifiCredentials::new("a", "b"))
            .unwrap();
        assert_eq!(store.load_wifi_credentials(), Some(WifiCredentials::new("a", "b")));
    }

    #[test]
    fn test_capacity_boundary() {
        let mut store = store();
        let ssid = "s".repeat(200);

        let fits = WifiCredentials::new(&ssid, &"p".repeat(310));
        assert_eq!(fits.encoded_len(), 512);
        store.save_wifi_credentials(&fits).unwrap();
        assert_eq!(store.load_wifi_credentials(), Some(fits));

        let too_long = WifiCredentials::new(&ssid, &"p".repeat(311));
        let writes = store.storage().writes();
        assert_eq!(
            store.save_wifi_credentials(&too_long),
            Err(CredentialError::TooLong {
                needed: 513,
                capacity: 512
            })
        );
        assert_eq!(store.storage().writes(), writes, "nothing written");
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut store = store();
        assert_eq!(
            store.save_wifi_credentials(&WifiCredentials::new("", "x")),
            Err(CredentialError::EmptySsid)
        );
        assert_eq!(
            store.save_wifi_credentials(&WifiCredentials::new("a\0b", "x")),
            Err(CredentialError::InteriorNul)
        );
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn test_blank_region_has_no_credentials() {
        let mut store = store();
        assert_eq!(store.load_wifi_credentials(), None);
    }

    #[test]
    fn test_empty_password_is_not_loaded() {
        let mut store = store();
        store
            .save_wifi_credentials(&WifiCredentials::new("OpenNet", ""))
            .unwrap();
        assert_eq!(store.load_wifi_credentials(), None);
    }

    #[test]
    fn test_region_at_offset() {
        let mut store = CredentialStore::new(MemoryStorage::<1024>::new(), 512);
        store
            .save_wifi_credentials(&WifiCredentials::new("Net1", "Pass1"))
            .unwrap();
        assert_eq!(store.storage().as_bytes()[0], 0xFF);
        assert_eq!(
            store.load_wifi_credentials(),
            Some(WifiCredentials::new("Net1", "Pass1"))
        );
    }
}
