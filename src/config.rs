//! Persisted app-lock configuration.
//!
//! `AppLockConfig` survives restarts in secure storage and is cached
//! in memory for cheap reads. Setters persist first and only then
//! update the cache, so a storage failure leaves the visible config
//! unchanged. Credential presence is derived from the PIN key, never
//! stored here.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

use crate::storage::{SecureStorage, StorageError, KEY_LOCK_CONFIG};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Active protection method for the app lock and protected actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    Pin,
    /// Convenience layer on top of an existing PIN, never a standalone
    /// credential.
    Biometric,
}

/// Inactivity window before the lock engages after backgrounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockTimer {
    Immediate,
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
    Never,
}

impl LockTimer {
    /// Delay before engagement. `None` means the lock never engages
    /// from backgrounding alone.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            LockTimer::Immediate => Some(Duration::ZERO),
            LockTimer::ThirtySeconds => Some(Duration::from_secs(30)),
            LockTimer::OneMinute => Some(Duration::from_secs(60)),
            LockTimer::FiveMinutes => Some(Duration::from_secs(300)),
            LockTimer::Never => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LockTimer::Immediate => "Immediately",
            LockTimer::ThirtySeconds => "After 30 seconds",
            LockTimer::OneMinute => "After 1 minute",
            LockTimer::FiveMinutes => "After 5 minutes",
            LockTimer::Never => "Never",
        }
    }

    /// Label/value pairs for a settings picker.
    pub fn options() -> Vec<(&'static str, LockTimer)> {
        [
            LockTimer::Immediate,
            LockTimer::ThirtySeconds,
            LockTimer::OneMinute,
            LockTimer::FiveMinutes,
            LockTimer::Never,
        ]
        .into_iter()
        .map(|t| (t.label(), t))
        .collect()
    }
}

/// Persisted app-lock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLockConfig {
    pub lock_enabled: bool,
    pub lock_timer: LockTimer,
    pub auth_method: Option<AuthMethod>,
}

impl Default for AppLockConfig {
    fn default() -> Self {
        Self {
            lock_enabled: false,
            lock_timer: LockTimer::OneMinute,
            auth_method: None,
        }
    }
}

/// Storage-backed config with an in-memory cache.
pub struct ConfigStore {
    storage: Arc<dyn SecureStorage>,
    cached: RwLock<AppLockConfig>,
}

impl ConfigStore {
    /// Load the persisted config, falling back to defaults when none
    /// has been written yet.
    pub fn load(storage: Arc<dyn SecureStorage>) -> Result<Self, ConfigError> {
        let cached = match storage.get(KEY_LOCK_CONFIG)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => AppLockConfig::default(),
        };
        Ok(Self {
            storage,
            cached: RwLock::new(cached),
        })
    }

    pub fn get(&self) -> AppLockConfig {
        *self.cached.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_lock_enabled(&self) -> bool {
        self.get().lock_enabled
    }

    pub fn lock_timer(&self) -> LockTimer {
        self.get().lock_timer
    }

    pub fn auth_method(&self) -> Option<AuthMethod> {
        self.get().auth_method
    }

    pub fn set_lock_enabled(&self, enabled: bool) -> Result<(), ConfigError> {
        self.update(|c| c.lock_enabled = enabled)
    }

    pub fn set_lock_timer(&self, timer: LockTimer) -> Result<(), ConfigError> {
        self.update(|c| c.lock_timer = timer)
    }

    pub fn set_auth_method(&self, method: Option<AuthMethod>) -> Result<(), ConfigError> {
        self.update(|c| c.auth_method = method)
    }

    fn update<F: FnOnce(&mut AppLockConfig)>(&self, mutate: F) -> Result<(), ConfigError> {
        let mut config = self.get();
        mutate(&mut config);

        // Persist before updating the cache so readers never observe a
        // config that failed to commit.
        let bytes = bincode::serialize(&config)?;
        self.storage.set(KEY_LOCK_CONFIG, &bytes)?;

        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = config;
        log::debug!(
            "app lock config updated: enabled={} timer={:?} method={:?}",
            config.lock_enabled,
            config.lock_timer,
            config.auth_method
        );
        Ok(())
    }
}
