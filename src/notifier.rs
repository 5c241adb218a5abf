//! Lock engagement notifications.
//!
//! Open modals and in-progress forms subscribe here so they can close
//! when the lock engages. Callbacks run synchronously on the notifying
//! task, after the state flip has been committed, so a subscriber that
//! reads lock state from its callback never observes a stale
//! `Unlocked`.

use std::sync::RwLock;

/// What caused the transition into `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTrigger {
    /// The background inactivity timer elapsed.
    BackgroundTimeout,
    /// An explicit lock request (e.g. a settings action).
    Manual,
}

/// Event delivered to subscribers on each transition into `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Engaged(LockTrigger),
}

type LockObserver = Box<dyn Fn(LockEvent) + Send + Sync>;

/// Publish/subscribe channel for lock engagement.
#[derive(Default)]
pub struct LockNotifier {
    observers: RwLock<Vec<LockObserver>>,
}

impl LockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future lock engagement.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(LockEvent) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(observer));
    }

    /// Deliver `event` to all subscribers, in subscription order.
    pub fn notify(&self, event: LockEvent) {
        let observers = self.observers.read().unwrap_or_else(|e| e.into_inner());
        log::debug!("lock event {:?} -> {} subscriber(s)", event, observers.len());
        for observer in observers.iter() {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_all_subscribers_notified() {
        let notifier = LockNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            notifier.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.notify(LockEvent::Engaged(LockTrigger::BackgroundTimeout));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_payload() {
        let notifier = LockNotifier::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        notifier.subscribe(move |event| {
            seen_clone.lock().unwrap().push(event);
        });

        notifier.notify(LockEvent::Engaged(LockTrigger::Manual));
        notifier.notify(LockEvent::Engaged(LockTrigger::BackgroundTimeout));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                LockEvent::Engaged(LockTrigger::Manual),
                LockEvent::Engaged(LockTrigger::BackgroundTimeout),
            ]
        );
    }

    #[test]
    fn test_no_subscribers_is_fine() {
        let notifier = LockNotifier::new();
        notifier.notify(LockEvent::Engaged(LockTrigger::Manual));
    }
}
