//! Reference-counted suppression of the auto-lock timer.
//!
//! Launching a native image or camera picker backgrounds the app from
//! the OS's point of view; without suppression the lifecycle monitor
//! would engage the lock and discard in-flight UI state the instant
//! the picker opens. Reasons are refcounted so nested or repeated
//! flows compose, and [`SuppressionGuard`] releases on drop so every
//! exit path (success, cancel, error, permission denied) is covered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Refcounted set of reasons blocking lock engagement.
#[derive(Default)]
pub struct SuppressionRegistry {
    reasons: Mutex<HashMap<String, usize>>,
}

impl SuppressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the refcount for `reason`.
    pub fn enable(&self, reason: &str) {
        let mut reasons = self.reasons.lock().unwrap_or_else(|e| e.into_inner());
        let count = reasons.entry(reason.to_string()).or_insert(0);
        *count += 1;
        log::debug!("lock suppression enabled: {} (count {})", reason, count);
    }

    /// Decrement the refcount for `reason`; never goes below zero.
    pub fn disable(&self, reason: &str) {
        let mut reasons = self.reasons.lock().unwrap_or_else(|e| e.into_inner());
        match reasons.get_mut(reason) {
            Some(count) if *count > 1 => {
                *count -= 1;
                log::debug!("lock suppression released: {} (count {})", reason, count);
            }
            Some(_) => {
                reasons.remove(reason);
                log::debug!("lock suppression released: {} (count 0)", reason);
            }
            None => {
                log::warn!("lock suppression released for unknown reason: {}", reason);
            }
        }
    }

    /// True iff any reason has count > 0.
    pub fn is_suppressed(&self) -> bool {
        !self
            .reasons
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Scoped suppression: released when the guard drops, on every
    /// exit path.
    pub fn suppress(self: Arc<Self>, reason: &str) -> SuppressionGuard {
        self.enable(reason);
        SuppressionGuard {
            registry: self,
            reason: reason.to_string(),
        }
    }
}

/// RAII handle for a single suppression reference.
pub struct SuppressionGuard {
    registry: Arc<SuppressionRegistry>,
    reason: String,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.registry.disable(&self.reason);
    }
}
