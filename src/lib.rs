//! App Lock & Protected-Action Authentication
//!
//! Guards sensitive in-app operations (key export, data reset, PIN
//! changes) behind a re-authentication gate and auto-locks the app
//! after a period of inactivity:
//! - PIN credentials hashed with Argon2id, never stored in plaintext
//! - Biometric authentication as a convenience layer on top of the PIN
//! - Foreground/background-driven lock timer with refcounted
//!   suppression windows for picker/camera flows
//! - A single protected-action executor every sensitive feature calls
//!   through (biometric attempt, PIN fallback, direct execution)
//! - Lock engagement notifications so open modals close on lock

pub mod biometric;
pub mod config;
pub mod lock;
pub mod notifier;
pub mod pin;
pub mod protect;
pub mod service;
pub mod storage;
pub mod suppression;

pub use biometric::{BiometricAuthenticator, BiometricOutcome, CancelReason, MockBiometric};
pub use config::{AppLockConfig, AuthMethod, ConfigError, ConfigStore, LockTimer};
pub use lock::{LifecycleEvent, LockMonitor, LockState};
pub use notifier::{LockEvent, LockNotifier, LockTrigger};
pub use pin::{PinError, PinStore, SecurePin, PIN_MAX_LENGTH, PIN_MIN_LENGTH};
pub use protect::{
    ActionError, GateOutcome, MockPinPrompt, Notice, PinPrompt, PromptConfig,
    ProtectedActionExecutor,
};
pub use service::{AppLockError, AppLockService};
pub use storage::{MemoryStorage, SecureStorage, SledStorage, StorageError};
pub use suppression::{SuppressionGuard, SuppressionRegistry};
