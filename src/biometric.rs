//! Biometric authentication interface.
//!
//! Platform-agnostic contract over the OS biometric prompt:
//! - iOS: Face ID, Touch ID via LocalAuthentication
//! - Android: BiometricPrompt API
//! - Desktop: Windows Hello, macOS Touch ID
//!
//! The executor distinguishes cancellations (silent fallback to PIN)
//! from genuine failures (error surfaced, then fallback), so the
//! outcome is a tagged variant rather than a bool plus optional code.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Why a biometric prompt was dismissed without a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user dismissed the prompt.
    User,
    /// The OS dismissed the prompt (e.g. app backgrounded).
    System,
    /// The app itself withdrew the prompt.
    App,
}

/// Result of one biometric authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    Cancelled(CancelReason),
    Failed { code: String, message: String },
}

impl BiometricOutcome {
    /// Cancellations fall back to PIN without surfacing an error.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BiometricOutcome::Cancelled(_))
    }
}

type AuthFuture<'a> = Pin<Box<dyn Future<Output = BiometricOutcome> + Send + 'a>>;

/// Platform biometric capability and prompt contract.
pub trait BiometricAuthenticator: Send + Sync {
    /// Hardware present and biometrics enrolled. Safe to cache for the
    /// lifetime of the process.
    fn is_supported(&self) -> bool;

    /// Whether a prompt can be shown right now. Enrollment and
    /// permissions can change between launches, so this is re-checked
    /// at the moment of each protected action rather than cached.
    fn is_available(&self) -> bool;

    /// Show the platform prompt with a human-readable reason.
    fn authenticate(&self, reason: &str) -> AuthFuture<'_>;
}

/// Scriptable biometric authenticator for tests and demos.
///
/// Outcomes are consumed front-to-back from a queue; an empty queue
/// yields `Failed` so a misconfigured test cannot silently pass the
/// gate.
pub struct MockBiometric {
    supported: AtomicBool,
    available: AtomicBool,
    outcomes: Mutex<VecDeque<BiometricOutcome>>,
}

impl MockBiometric {
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            available: AtomicBool::new(true),
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    /// Authenticator that always succeeds.
    pub fn always_success() -> Self {
        let mock = Self::new();
        mock.push_outcome(BiometricOutcome::Success);
        mock
    }

    /// Authenticator reporting no biometric hardware.
    pub fn unsupported() -> Self {
        let mock = Self::new();
        mock.supported.store(false, Ordering::SeqCst);
        mock.available.store(false, Ordering::SeqCst);
        mock
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Queue the outcome for the next `authenticate` call.
    pub fn push_outcome(&self, outcome: BiometricOutcome) {
        self.outcomes
            .lock()
            .expect("outcome queue lock")
            .push_back(outcome);
    }
}

impl Default for MockBiometric {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricAuthenticator for MockBiometric {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn authenticate(&self, _reason: &str) -> AuthFuture<'_> {
        let outcome = self
            .outcomes
            .lock()
            .expect("outcome queue lock")
            .pop_front()
            .unwrap_or(BiometricOutcome::Failed {
                code: "no_scripted_outcome".to_string(),
                message: "mock outcome queue empty".to_string(),
            });

        // The last scripted Success sticks, so always_success() keeps
        // succeeding across repeated attempts.
        if outcome == BiometricOutcome::Success {
            let mut queue = self.outcomes.lock().expect("outcome queue lock");
            if queue.is_empty() {
                queue.push_back(BiometricOutcome::Success);
            }
        }

        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockBiometric::always_success();
        assert!(mock.is_supported());
        assert!(mock.is_available());
        assert_eq!(mock.authenticate("unlock").await, BiometricOutcome::Success);
        // Success persists across attempts.
        assert_eq!(mock.authenticate("unlock").await, BiometricOutcome::Success);
    }

    #[tokio::test]
    async fn test_mock_scripted_sequence() {
        let mock = MockBiometric::new();
        mock.push_outcome(BiometricOutcome::Cancelled(CancelReason::User));
        mock.push_outcome(BiometricOutcome::Success);

        assert_eq!(
            mock.authenticate("x").await,
            BiometricOutcome::Cancelled(CancelReason::User)
        );
        assert_eq!(mock.authenticate("x").await, BiometricOutcome::Success);
    }

    #[tokio::test]
    async fn test_mock_empty_queue_fails() {
        let mock = MockBiometric::new();
        let outcome = mock.authenticate("x").await;
        assert!(matches!(outcome, BiometricOutcome::Failed { .. }));
    }

    #[test]
    fn test_unsupported() {
        let mock = MockBiometric::unsupported();
        assert!(!mock.is_supported());
        assert!(!mock.is_available());
    }

    #[test]
    fn test_cancellation_classification() {
        assert!(BiometricOutcome::Cancelled(CancelReason::System).is_cancellation());
        assert!(!BiometricOutcome::Success.is_cancellation());
        assert!(!BiometricOutcome::Failed {
            code: "lockout".to_string(),
            message: String::new(),
        }
        .is_cancellation());
    }
}
