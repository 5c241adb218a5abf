//! Protected action executor.
//!
//! Single chokepoint for every sensitive operation (key export, data
//! reset, PIN changes, unlocking the app). The gate tries strategies
//! in a fixed order: biometric when preferred and currently available,
//! then PIN, then no gate when neither credential is configured.
//!
//! Concurrency: one prompt at a time. A second invocation while one is
//! pending is rejected with [`GateOutcome::Busy`] rather than queued,
//! so a stuck prompt can never pile up hidden work behind it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::biometric::{BiometricAuthenticator, BiometricOutcome};
use crate::config::{AuthMethod, ConfigStore};
use crate::pin::{PinStore, SecurePin};

/// Error type actions report through the gate.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Human-readable prompt configuration for one gate attempt.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Shown by the platform biometric prompt.
    pub reason: String,
    /// Title of the PIN entry prompt.
    pub pin_title: String,
    /// Instructional text under the PIN entry title.
    pub pin_message: String,
}

impl PromptConfig {
    pub fn new(reason: &str, pin_title: &str, pin_message: &str) -> Self {
        Self {
            reason: reason.to_string(),
            pin_title: pin_title.to_string(),
            pin_message: pin_message.to_string(),
        }
    }
}

/// Non-fatal notification for the UI (toast material).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
}

/// Terminal result of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Authentication passed (or no gate configured) and the action ran
    /// to completion.
    Executed,
    /// Authentication passed but the action itself failed.
    ActionFailed,
    /// The user dismissed the PIN prompt; nothing ran, nothing shown.
    Cancelled,
    /// The credential store failed during verification; nothing ran.
    AuthError,
    /// Another protected action is already awaiting user input.
    Busy,
}

type PinFuture<'a> = Pin<Box<dyn Future<Output = Option<SecurePin>> + Send + 'a>>;

/// PIN entry surface. On a wrong PIN the executor calls this again
/// with an inline error instead of dismissing, so the prompt supports
/// retry in place; returning `None` means the user dismissed it.
pub trait PinPrompt: Send + Sync {
    fn request_pin<'a>(
        &'a self,
        config: &'a PromptConfig,
        inline_error: Option<&'a str>,
    ) -> PinFuture<'a>;
}

type NoticeSink = Box<dyn Fn(Notice) + Send + Sync>;

/// The gate every sensitive feature calls through.
pub struct ProtectedActionExecutor {
    config: Arc<ConfigStore>,
    pin: Arc<PinStore>,
    biometric: Arc<dyn BiometricAuthenticator>,
    pin_prompt: Arc<dyn PinPrompt>,
    notices: NoticeSink,
    in_flight: tokio::sync::Mutex<()>,
}

impl ProtectedActionExecutor {
    pub fn new(
        config: Arc<ConfigStore>,
        pin: Arc<PinStore>,
        biometric: Arc<dyn BiometricAuthenticator>,
        pin_prompt: Arc<dyn PinPrompt>,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            pin,
            biometric,
            pin_prompt,
            notices: Box::new(on_notice),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Run `action` behind the configured authentication gate.
    ///
    /// Strategy order: biometric (when preferred, supported and
    /// available right now), PIN, ungated. Cancelled biometric
    /// attempts fall through to PIN silently; other biometric failures
    /// surface one error notice and still fall through so the user has
    /// a recovery path. Action errors are caught here and reported as
    /// a notice; they never escape.
    pub async fn execute<F, Fut>(&self, prompt: &PromptConfig, action: F) -> GateOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        let _flight = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("protected action rejected: another prompt is pending");
                return GateOutcome::Busy;
            }
        };

        if self.config.auth_method() == Some(AuthMethod::Biometric) && self.biometric.is_supported()
        {
            // Availability can change between launches; never trust a
            // cached answer at the moment of the attempt.
            if self.biometric.is_available() {
                match self.biometric.authenticate(&prompt.reason).await {
                    BiometricOutcome::Success => return self.run_action(action).await,
                    BiometricOutcome::Cancelled(reason) => {
                        log::debug!("biometric cancelled ({:?}), falling back to PIN", reason);
                    }
                    BiometricOutcome::Failed { code, message } => {
                        log::warn!("biometric failed ({}): {}", code, message);
                        (self.notices)(Notice::Error(format!(
                            "Biometric authentication failed: {}",
                            message
                        )));
                    }
                }
            } else {
                log::debug!("biometric preferred but unavailable, falling back to PIN");
            }
        }

        if self.pin.has_pin() {
            let mut inline_error: Option<String> = None;
            loop {
                let entered = self
                    .pin_prompt
                    .request_pin(prompt, inline_error.as_deref())
                    .await;
                let candidate = match entered {
                    Some(candidate) => candidate,
                    // Dismissal is a user cancel; silent, like the
                    // cancellable biometric codes.
                    None => return GateOutcome::Cancelled,
                };
                match self.pin.verify_pin(&candidate) {
                    Ok(true) => break,
                    Ok(false) => inline_error = Some("Incorrect PIN".to_string()),
                    Err(e) => {
                        log::error!("PIN verification error: {}", e);
                        (self.notices)(Notice::Error("Failed to verify PIN".to_string()));
                        return GateOutcome::AuthError;
                    }
                }
            }
            return self.run_action(action).await;
        }

        // Neither biometric nor PIN configured: no gate.
        self.run_action(action).await
    }

    async fn run_action<F, Fut>(&self, action: F) -> GateOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        match action().await {
            Ok(()) => GateOutcome::Executed,
            Err(e) => {
                log::error!("protected action failed: {}", e);
                (self.notices)(Notice::Error(format!("Operation failed: {}", e)));
                GateOutcome::ActionFailed
            }
        }
    }
}

/// Scripted PIN prompt for tests and demos. Responses are consumed
/// front-to-back; an empty queue behaves as a dismissal.
#[derive(Default)]
pub struct MockPinPrompt {
    responses: std::sync::Mutex<std::collections::VecDeque<Option<String>>>,
    seen_errors: std::sync::Mutex<Vec<String>>,
}

impl MockPinPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next entry: `Some(pin)` for input, `None` for a
    /// dismissal.
    pub fn push_entry(&self, entry: Option<&str>) {
        self.responses
            .lock()
            .expect("response queue lock")
            .push_back(entry.map(str::to_string));
    }

    /// Inline errors the prompt was re-shown with.
    pub fn seen_errors(&self) -> Vec<String> {
        self.seen_errors.lock().expect("seen errors lock").clone()
    }
}

impl PinPrompt for MockPinPrompt {
    fn request_pin<'a>(
        &'a self,
        _config: &'a PromptConfig,
        inline_error: Option<&'a str>,
    ) -> PinFuture<'a> {
        if let Some(error) = inline_error {
            self.seen_errors
                .lock()
                .expect("seen errors lock")
                .push(error.to_string());
        }
        let entry = self
            .responses
            .lock()
            .expect("response queue lock")
            .pop_front()
            .flatten();
        Box::pin(async move {
            match entry {
                Some(pin) => SecurePin::new(pin).ok(),
                None => None,
            }
        })
    }
}
