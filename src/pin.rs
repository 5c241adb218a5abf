//! PIN credential store.
//!
//! Owns PIN creation, verification and deletion. The raw PIN never
//! leaves the [`SecurePin`] wrapper (zeroed on drop) and is never
//! persisted; only a salted Argon2id hash in PHC string format reaches
//! storage. Verification goes through `Argon2::verify_password`, so
//! there is no byte-wise short-circuit comparison anywhere.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use thiserror::Error;
use zeroize::ZeroizeOnDrop;

use crate::storage::{SecureStorage, StorageError, KEY_PIN_HASH};

/// Minimum accepted PIN length.
pub const PIN_MIN_LENGTH: usize = 4;
/// Maximum accepted PIN length.
pub const PIN_MAX_LENGTH: usize = 8;

#[derive(Error, Debug)]
pub enum PinError {
    #[error("Invalid PIN format")]
    InvalidFormat,

    #[error("PIN too short (minimum {0} characters)")]
    TooShort(usize),

    #[error("PIN too long (maximum {0} characters)")]
    TooLong(usize),

    #[error("Hash error")]
    HashError,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Secure PIN wrapper that zeros memory on drop.
#[derive(ZeroizeOnDrop)]
pub struct SecurePin(String);

impl SecurePin {
    /// Create a new secure PIN. Rejects empty input; length bounds are
    /// enforced at setup time, not here, so verification can accept
    /// candidates of any length.
    pub fn new(pin: String) -> Result<Self, PinError> {
        if pin.is_empty() {
            return Err(PinError::InvalidFormat);
        }
        Ok(Self(pin))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// PIN credential store backed by secure storage.
pub struct PinStore {
    storage: Arc<dyn SecureStorage>,
}

impl PinStore {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Set up (or replace) the PIN credential.
    ///
    /// Validates length before touching storage, then persists a fresh
    /// salted Argon2id hash, overwriting any prior credential.
    pub fn setup_pin(&self, pin: &SecurePin) -> Result<(), PinError> {
        if pin.len() < PIN_MIN_LENGTH {
            return Err(PinError::TooShort(PIN_MIN_LENGTH));
        }
        if pin.len() > PIN_MAX_LENGTH {
            return Err(PinError::TooLong(PIN_MAX_LENGTH));
        }

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|_| PinError::HashError)?
            .to_string();

        self.storage.set(KEY_PIN_HASH, hash.as_bytes())?;
        log::info!("PIN credential stored");
        Ok(())
    }

    /// Verify a PIN candidate against the stored credential.
    ///
    /// Returns `Ok(false)` for a wrong PIN or when no credential
    /// exists; errors are reserved for storage and hash-parse failures.
    pub fn verify_pin(&self, pin: &SecurePin) -> Result<bool, PinError> {
        let stored = match self.storage.get(KEY_PIN_HASH)? {
            Some(bytes) => bytes,
            None => return Ok(false),
        };

        let hash_str = std::str::from_utf8(&stored).map_err(|_| PinError::HashError)?;
        let parsed = PasswordHash::new(hash_str).map_err(|_| PinError::HashError)?;

        Ok(Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok())
    }

    /// Delete the PIN credential. Cascading effects (disabling the
    /// lock, clearing the auth-method preference) are the caller's
    /// responsibility.
    pub fn clear_pin(&self) -> Result<(), PinError> {
        self.storage.delete(KEY_PIN_HASH)?;
        log::info!("PIN credential cleared");
        Ok(())
    }

    /// Non-failing capability probe.
    pub fn has_pin(&self) -> bool {
        matches!(self.storage.get(KEY_PIN_HASH), Ok(Some(_)))
    }
}
