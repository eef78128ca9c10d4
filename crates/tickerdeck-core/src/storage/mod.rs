//! Persistent storage: the WiFi credential region and an in-RAM backend.

mod credentials;

pub use credentials::{CredentialError, CredentialStore, WifiCredentials};

use embedded_storage::{ReadStorage, Storage};

/// RAM-backed region, erased to `0xFF` like fresh flash.
///
/// Used by the simulator and by tests.
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
    writes: usize,
}

impl<const N: usize> MemoryStorage<N> {
    pub const fn new() -> Self {
        Self {
            bytes: [0xFF; N],
            writes: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Number of write calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Access outside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds;

impl<const N: usize> ReadStorage for MemoryStorage<N> {
    type Error = OutOfBounds;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let src = self
            .bytes
            .get(start..start + bytes.len())
            .ok_or(OutOfBounds)?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for MemoryStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let dst = self
            .bytes
            .get_mut(start..start + bytes.len())
            .ok_or(OutOfBounds)?;
        dst.copy_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }
}
