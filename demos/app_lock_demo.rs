//! Example: App lock and protected actions end to end.

use std::sync::Arc;
use std::time::Duration;

use app_lock::{
    AppLockService, AuthMethod, BiometricOutcome, CancelReason, GateOutcome, LifecycleEvent,
    LockTimer, MemoryStorage, MockBiometric, MockPinPrompt, PromptConfig, SecurePin,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== App Lock Example ===\n");

    let prompt = Arc::new(MockPinPrompt::new());
    let biometric = Arc::new(MockBiometric::new());
    let service = AppLockService::new(
        Arc::new(MemoryStorage::new()),
        biometric.clone(),
        prompt.clone(),
        |notice| println!("   [toast] {:?}", notice),
    )?;

    // 1. Set up a PIN
    println!("1. Setting up PIN...");
    service.setup_pin(&SecurePin::new("2468".to_string())?)?;
    println!("   has_pin = {}\n", service.has_pin());

    // 2. Enable the app lock
    println!("2. Enabling app lock (immediate timer)...");
    service.set_lock_enabled(true)?;
    service.set_lock_timer(LockTimer::Immediate)?;
    for (label, _) in service.timer_options() {
        println!("   timer option: {}", label);
    }
    println!();

    // 3. Subscribe to lock events
    service.subscribe_lock_events(|event| {
        println!("   [subscriber] lock event: {:?}", event);
    });

    // 4. Background the app: lock engages immediately
    println!("3. Backgrounding the app...");
    service
        .handle_lifecycle_event(LifecycleEvent::Backgrounded)
        .await;
    println!("   locked = {}\n", service.is_locked().await);

    // 5. Unlock through the gate with the PIN
    println!("4. Unlocking with PIN...");
    prompt.push_entry(Some("2468"));
    let outcome = service
        .unlock_app(&PromptConfig::new(
            "Unlock the app",
            "Enter PIN",
            "Enter your PIN to continue",
        ))
        .await;
    println!("   outcome = {:?}, locked = {}\n", outcome, service.is_locked().await);

    // 6. Prefer biometrics and gate a sensitive action
    println!("5. Switching to biometric with a cancelled attempt...");
    service.set_auth_method(Some(AuthMethod::Biometric))?;
    biometric.push_outcome(BiometricOutcome::Cancelled(CancelReason::User));
    prompt.push_entry(Some("2468"));
    let outcome = service
        .execute_protected_action(
            &PromptConfig::new("Export keys", "Enter PIN", "Confirm to export your keys"),
            || async {
                println!("   [action] exporting keys");
                Ok(())
            },
        )
        .await;
    println!("   outcome = {:?} (silent fallback to PIN)\n", outcome);
    assert_eq!(outcome, GateOutcome::Executed);

    // 7. Suppression keeps the picker flow alive
    println!("6. Opening an image picker (lock suppressed)...");
    {
        let _guard = service.suppress_lock("image-picker");
        service
            .handle_lifecycle_event(LifecycleEvent::Backgrounded)
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        println!("   locked while picker open = {}", service.is_locked().await);
    }
    println!("   suppressed after picker closed = {}\n", service.is_lock_suppressed());

    // 8. Turning the PIN off tears everything down
    println!("7. Disabling PIN...");
    service.disable_pin()?;
    println!(
        "   has_pin = {}, lock_enabled = {}, auth_method = {:?}",
        service.has_pin(),
        service.is_lock_enabled(),
        service.auth_method()
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
