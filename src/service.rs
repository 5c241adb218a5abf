//! App lock service facade.
//!
//! Single entry point the rest of the app talks to: PIN lifecycle,
//! auth-method arbitration, lock settings, suppression, lifecycle
//! events and the protected-action gate. Only this layer mutates the
//! persisted config and credential together, so every mutation path
//! lands in a valid combination (never lock-enabled without a
//! credential, never biometric without a PIN behind it).

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::biometric::BiometricAuthenticator;
use crate::config::{AppLockConfig, AuthMethod, ConfigError, ConfigStore, LockTimer};
use crate::lock::{LifecycleEvent, LockMonitor, LockState};
use crate::notifier::{LockEvent, LockNotifier};
use crate::pin::{PinError, PinStore, SecurePin};
use crate::protect::{
    ActionError, GateOutcome, Notice, PinPrompt, PromptConfig, ProtectedActionExecutor,
};
use crate::storage::SecureStorage;
use crate::suppression::{SuppressionGuard, SuppressionRegistry};

#[derive(Error, Debug)]
pub enum AppLockError {
    #[error("PIN error: {0}")]
    Pin(#[from] PinError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("A PIN must be set up first")]
    PinRequired,

    #[error("Biometric authentication is not supported on this device")]
    BiometricUnsupported,
}

/// Process-wide app lock service.
pub struct AppLockService {
    config: Arc<ConfigStore>,
    pin: Arc<PinStore>,
    biometric: Arc<dyn BiometricAuthenticator>,
    suppression: Arc<SuppressionRegistry>,
    notifier: Arc<LockNotifier>,
    monitor: Arc<LockMonitor>,
    executor: ProtectedActionExecutor,
    // Hardware capability does not change while the process lives;
    // enrollment/permission might, so availability is never cached.
    fingerprint_supported: bool,
}

impl AppLockService {
    pub fn new(
        storage: Arc<dyn SecureStorage>,
        biometric: Arc<dyn BiometricAuthenticator>,
        pin_prompt: Arc<dyn PinPrompt>,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Result<Self, AppLockError> {
        let config = Arc::new(ConfigStore::load(storage.clone())?);
        let pin = Arc::new(PinStore::new(storage));
        let suppression = Arc::new(SuppressionRegistry::new());
        let notifier = Arc::new(LockNotifier::new());
        let monitor = Arc::new(LockMonitor::new(
            config.clone(),
            suppression.clone(),
            notifier.clone(),
        ));
        let executor = ProtectedActionExecutor::new(
            config.clone(),
            pin.clone(),
            biometric.clone(),
            pin_prompt,
            on_notice,
        );
        let fingerprint_supported = biometric.is_supported();

        Ok(Self {
            config,
            pin,
            biometric,
            suppression,
            notifier,
            monitor,
            executor,
            fingerprint_supported,
        })
    }

    // ------------------------------------------------------------------
    // PIN credential
    // ------------------------------------------------------------------

    pub fn has_pin(&self) -> bool {
        self.pin.has_pin()
    }

    /// Set up or replace the PIN. Call sites gate the change flow
    /// through [`execute_protected_action`](Self::execute_protected_action).
    pub fn setup_pin(&self, pin: &SecurePin) -> Result<(), AppLockError> {
        self.pin.setup_pin(pin)?;
        Ok(())
    }

    pub fn verify_pin(&self, pin: &SecurePin) -> Result<bool, AppLockError> {
        Ok(self.pin.verify_pin(pin)?)
    }

    /// Remove the PIN and cascade: disable the app lock, then clear
    /// the auth-method preference, so the system never ends up with a
    /// lock enabled but no credential behind it.
    pub fn disable_pin(&self) -> Result<(), AppLockError> {
        self.pin.clear_pin()?;
        self.config.set_lock_enabled(false)?;
        self.config.set_auth_method(None)?;
        log::info!("PIN disabled; app lock and auth method cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lock settings
    // ------------------------------------------------------------------

    pub fn is_lock_enabled(&self) -> bool {
        self.config.is_lock_enabled()
    }

    /// Enabling the lock requires an existing PIN credential.
    pub fn set_lock_enabled(&self, enabled: bool) -> Result<(), AppLockError> {
        if enabled && !self.has_pin() {
            return Err(AppLockError::PinRequired);
        }
        self.config.set_lock_enabled(enabled)?;
        Ok(())
    }

    pub fn lock_timer(&self) -> LockTimer {
        self.config.lock_timer()
    }

    pub fn set_lock_timer(&self, timer: LockTimer) -> Result<(), AppLockError> {
        self.config.set_lock_timer(timer)?;
        Ok(())
    }

    /// Label/value pairs for the settings picker.
    pub fn timer_options(&self) -> Vec<(&'static str, LockTimer)> {
        LockTimer::options()
    }

    pub fn lock_config(&self) -> AppLockConfig {
        self.config.get()
    }

    // ------------------------------------------------------------------
    // Auth method arbitration
    // ------------------------------------------------------------------

    pub fn auth_method(&self) -> Option<AuthMethod> {
        self.config.auth_method()
    }

    /// Change the active protection method.
    ///
    /// Biometric is a convenience layer on top of the PIN, never a
    /// replacement credential, so selecting it without a PIN (or
    /// without platform support) is rejected with an error rather than
    /// ignored.
    pub fn set_auth_method(&self, method: Option<AuthMethod>) -> Result<(), AppLockError> {
        if method.is_some() && !self.has_pin() {
            return Err(AppLockError::PinRequired);
        }
        if method == Some(AuthMethod::Biometric) && !self.fingerprint_supported {
            return Err(AppLockError::BiometricUnsupported);
        }
        self.config.set_auth_method(method)?;
        Ok(())
    }

    pub fn is_fingerprint_supported(&self) -> bool {
        self.fingerprint_supported
    }

    /// Live availability check, re-evaluated on every call.
    pub fn is_biometric_available(&self) -> bool {
        self.biometric.is_available()
    }

    // ------------------------------------------------------------------
    // Lock state and lifecycle
    // ------------------------------------------------------------------

    pub async fn lock_state(&self) -> LockState {
        self.monitor.lock_state().await
    }

    pub async fn is_locked(&self) -> bool {
        self.monitor.is_locked().await
    }

    /// Feed a platform foreground/background transition in.
    pub async fn handle_lifecycle_event(&self, event: LifecycleEvent) {
        self.monitor.handle_event(event).await;
    }

    /// Engage the lock immediately (explicit user request).
    pub async fn lock_now(&self) {
        self.monitor.lock().await;
    }

    /// Authenticate and release the lock. This protected action is the
    /// only path from `Locked` back to `Unlocked`.
    pub async fn unlock_app(&self, prompt: &PromptConfig) -> GateOutcome {
        let monitor = self.monitor.clone();
        self.executor
            .execute(prompt, move || async move {
                monitor.unlock().await;
                Ok(())
            })
            .await
    }

    /// Subscribe to lock engagement events (modals and forms close on
    /// these).
    pub fn subscribe_lock_events<F>(&self, observer: F)
    where
        F: Fn(LockEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(observer);
    }

    // ------------------------------------------------------------------
    // Suppression
    // ------------------------------------------------------------------

    pub fn enable_lock_suppression(&self, reason: &str) {
        self.suppression.enable(reason);
    }

    pub fn disable_lock_suppression(&self, reason: &str) {
        self.suppression.disable(reason);
    }

    pub fn is_lock_suppressed(&self) -> bool {
        self.suppression.is_suppressed()
    }

    /// Scoped suppression for picker/camera flows; released on drop on
    /// every exit path.
    pub fn suppress_lock(&self, reason: &str) -> SuppressionGuard {
        self.suppression.clone().suppress(reason)
    }

    // ------------------------------------------------------------------
    // Protected actions
    // ------------------------------------------------------------------

    /// Run a sensitive operation behind the authentication gate.
    pub async fn execute_protected_action<F, Fut>(
        &self,
        prompt: &PromptConfig,
        action: F,
    ) -> GateOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        self.executor.execute(prompt, action).await
    }
}
