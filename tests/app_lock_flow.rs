//! End-to-end flows through the app lock service: settings cascades,
//! backgrounding with suppression windows, and gated unlock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_lock::{
    AppLockService, AuthMethod, BiometricOutcome, CancelReason, GateOutcome, LifecycleEvent,
    LockTimer, MemoryStorage, MockBiometric, MockPinPrompt, Notice, PromptConfig, SecurePin,
};

struct App {
    service: AppLockService,
    prompt: Arc<MockPinPrompt>,
    biometric: Arc<MockBiometric>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

fn app(biometric: MockBiometric) -> App {
    let prompt = Arc::new(MockPinPrompt::new());
    let biometric = Arc::new(biometric);
    let notices = Arc::new(Mutex::new(Vec::new()));

    let sink = notices.clone();
    let service = AppLockService::new(
        Arc::new(MemoryStorage::new()),
        biometric.clone(),
        prompt.clone(),
        move |notice| sink.lock().unwrap().push(notice),
    )
    .unwrap();

    App {
        service,
        prompt,
        biometric,
        notices,
    }
}

fn pin(s: &str) -> SecurePin {
    SecurePin::new(s.to_string()).unwrap()
}

fn unlock_prompt() -> PromptConfig {
    PromptConfig::new("Unlock the app", "Enter PIN", "Enter your PIN to continue")
}

#[tokio::test]
async fn locked_app_unlocks_only_through_the_gate() {
    let app = app(MockBiometric::unsupported());
    app.service.setup_pin(&pin("1234")).unwrap();
    app.service.set_lock_enabled(true).unwrap();
    app.service.set_lock_timer(LockTimer::Immediate).unwrap();

    let engagements = Arc::new(AtomicUsize::new(0));
    let engagements_clone = engagements.clone();
    app.service.subscribe_lock_events(move |_| {
        engagements_clone.fetch_add(1, Ordering::SeqCst);
    });

    app.service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    assert!(app.service.is_locked().await);
    assert_eq!(engagements.load(Ordering::SeqCst), 1);

    // Foregrounding alone never unlocks.
    app.service
        .handle_lifecycle_event(LifecycleEvent::Foregrounded)
        .await;
    assert!(app.service.is_locked().await);

    app.prompt.push_entry(Some("1234"));
    assert_eq!(
        app.service.unlock_app(&unlock_prompt()).await,
        GateOutcome::Executed
    );
    assert!(!app.service.is_locked().await);
}

#[tokio::test(start_paused = true)]
async fn suppression_window_outlasts_any_timer() {
    let app = app(MockBiometric::unsupported());
    app.service.setup_pin(&pin("1234")).unwrap();
    app.service.set_lock_enabled(true).unwrap();
    app.service.set_lock_timer(LockTimer::ThirtySeconds).unwrap();

    let _guard = app.service.suppress_lock("image-picker");
    app.service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    tokio::time::advance(Duration::from_secs(600)).await;
    tokio::task::yield_now().await;

    assert!(!app.service.is_locked().await);
}

#[tokio::test(start_paused = true)]
async fn never_timer_ignores_backgrounding() {
    let app = app(MockBiometric::unsupported());
    app.service.setup_pin(&pin("1234")).unwrap();
    app.service.set_lock_enabled(true).unwrap();
    app.service.set_lock_timer(LockTimer::Never).unwrap();

    app.service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    tokio::time::advance(Duration::from_secs(86_400)).await;
    tokio::task::yield_now().await;

    assert!(!app.service.is_locked().await);
}

#[tokio::test(start_paused = true)]
async fn quick_return_to_foreground_cancels_lock() {
    let app = app(MockBiometric::unsupported());
    app.service.setup_pin(&pin("1234")).unwrap();
    app.service.set_lock_enabled(true).unwrap();
    app.service.set_lock_timer(LockTimer::OneMinute).unwrap();

    app.service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    tokio::time::advance(Duration::from_secs(20)).await;
    app.service
        .handle_lifecycle_event(LifecycleEvent::Foregrounded)
        .await;
    tokio::time::advance(Duration::from_secs(300)).await;
    tokio::task::yield_now().await;

    assert!(!app.service.is_locked().await);
}

#[tokio::test]
async fn biometric_cancel_falls_back_to_pin_without_toast() {
    let biometric = MockBiometric::new();
    biometric.push_outcome(BiometricOutcome::Cancelled(CancelReason::User));
    let app = app(biometric);

    app.service.setup_pin(&pin("1234")).unwrap();
    app.service
        .set_auth_method(Some(AuthMethod::Biometric))
        .unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = ran.clone();
    let outcome = app
        .service
        .execute_protected_action(
            &PromptConfig::new("Export keys", "Enter PIN", "Confirm to export"),
            move || async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

    // Cancel fell through to the PIN path; with no entry queued the
    // prompt is dismissed and nothing runs or toasts.
    assert_eq!(outcome, GateOutcome::Cancelled);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert!(app.notices.lock().unwrap().is_empty());

    // Same gate again, this time entering the PIN.
    app.biometric
        .push_outcome(BiometricOutcome::Cancelled(CancelReason::System));
    app.prompt.push_entry(Some("1234"));
    let ran_clone = ran.clone();
    let outcome = app
        .service
        .execute_protected_action(
            &PromptConfig::new("Export keys", "Enter PIN", "Confirm to export"),
            move || async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

    assert_eq!(outcome, GateOutcome::Executed);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(app.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disabling_pin_tears_down_the_whole_lock() {
    let app = app(MockBiometric::always_success());
    app.service.setup_pin(&pin("1234")).unwrap();
    app.service.set_lock_enabled(true).unwrap();
    app.service
        .set_auth_method(Some(AuthMethod::Biometric))
        .unwrap();

    app.service.disable_pin().unwrap();

    assert!(!app.service.has_pin());
    assert!(!app.service.is_lock_enabled());
    assert_eq!(app.service.auth_method(), None);

    // With everything torn down, backgrounding does nothing and
    // protected actions run ungated.
    app.service.set_lock_timer(LockTimer::Immediate).unwrap();
    app.service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    assert!(!app.service.is_locked().await);

    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = ran.clone();
    let outcome = app
        .service
        .execute_protected_action(
            &PromptConfig::new("Reset app", "Enter PIN", "Confirm reset"),
            move || async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
    assert_eq!(outcome, GateOutcome::Executed);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
