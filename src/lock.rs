//! Lock state and lifecycle monitor.
//!
//! Watches foreground/background transitions and engages the app lock
//! after the configured inactivity window. Transitions are serialized
//! through a single state lock; the notifier fires only after a flip
//! into `Locked` has been committed, and before the engagement path
//! returns.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::ConfigStore;
use crate::notifier::{LockEvent, LockNotifier, LockTrigger};
use crate::suppression::SuppressionRegistry;

/// App lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// App is usable; protected actions still re-authenticate.
    Unlocked,
    /// App requires authentication before anything else.
    Locked,
}

/// Foreground/background transitions fed in by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Foregrounded,
    Backgrounded,
}

/// Lifecycle-driven auto-lock monitor.
pub struct LockMonitor {
    state: Arc<RwLock<LockState>>,
    config: Arc<ConfigStore>,
    suppression: Arc<SuppressionRegistry>,
    notifier: Arc<LockNotifier>,
    pending: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LockMonitor {
    pub fn new(
        config: Arc<ConfigStore>,
        suppression: Arc<SuppressionRegistry>,
        notifier: Arc<LockNotifier>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(LockState::Unlocked)),
            config,
            suppression,
            notifier,
            pending: std::sync::Mutex::new(None),
        }
    }

    pub async fn lock_state(&self) -> LockState {
        *self.state.read().await
    }

    pub async fn is_locked(&self) -> bool {
        *self.state.read().await == LockState::Locked
    }

    /// Feed a foreground/background transition into the monitor.
    pub async fn handle_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Foregrounded => self.cancel_pending(),
            LifecycleEvent::Backgrounded => self.on_backgrounded().await,
        }
    }

    async fn on_backgrounded(&self) {
        if self.is_locked().await {
            return;
        }
        if !self.config.is_lock_enabled() {
            return;
        }
        if self.suppression.is_suppressed() {
            log::debug!("backgrounded while suppressed, lock timer not started");
            return;
        }

        let delay = match self.config.lock_timer().delay() {
            Some(delay) => delay,
            // Never: backgrounding alone does not engage the lock.
            None => return,
        };

        if delay.is_zero() {
            Self::engage(
                &self.state,
                &self.config,
                &self.suppression,
                &self.notifier,
                LockTrigger::BackgroundTimeout,
            )
            .await;
            return;
        }

        let state = self.state.clone();
        let config = self.config.clone();
        let suppression = self.suppression.clone();
        let notifier = self.notifier.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            Self::engage(
                &state,
                &config,
                &suppression,
                &notifier,
                LockTrigger::BackgroundTimeout,
            )
            .await;
        });
        self.replace_pending(Some(handle));
        log::debug!("lock timer started ({:?})", delay);
    }

    /// Engage the lock from a timer firing. Config and suppression are
    /// re-checked here, immediately before the flip, so a suppression
    /// window opened during the countdown still blocks engagement.
    async fn engage(
        state: &RwLock<LockState>,
        config: &ConfigStore,
        suppression: &SuppressionRegistry,
        notifier: &LockNotifier,
        trigger: LockTrigger,
    ) {
        let mut state = state.write().await;
        if *state == LockState::Locked {
            return;
        }
        if !config.is_lock_enabled() || suppression.is_suppressed() {
            log::debug!("lock engagement skipped (disabled or suppressed)");
            return;
        }
        *state = LockState::Locked;
        drop(state);

        log::info!("app lock engaged ({:?})", trigger);
        notifier.notify(LockEvent::Engaged(trigger));
    }

    /// Lock right now regardless of timers or suppression (explicit
    /// user request, not a lifecycle event).
    pub async fn lock(&self) {
        let mut state = self.state.write().await;
        if *state == LockState::Locked {
            return;
        }
        *state = LockState::Locked;
        drop(state);

        log::info!("app lock engaged (manual)");
        self.notifier.notify(LockEvent::Engaged(LockTrigger::Manual));
    }

    /// Clear the lock. Only the protected-action executor's
    /// authentication success path calls this; re-foregrounding never
    /// does.
    pub(crate) async fn unlock(&self) {
        let mut state = self.state.write().await;
        if *state == LockState::Unlocked {
            return;
        }
        *state = LockState::Unlocked;
        log::info!("app lock released");
    }

    fn cancel_pending(&self) {
        self.replace_pending(None);
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
            log::debug!("pending lock timer cancelled");
        }
        *pending = next;
    }
}
