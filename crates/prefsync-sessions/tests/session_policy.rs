//! Capture write-back policy and apply orchestration over memory adapters

use prefsync_handlers::memory::MemoryAdapters;
use prefsync_handlers::RegistryValue;
use prefsync_model::{
    FinalizerDescription, HandlerDescription, PreferenceKey, Preferences, RegistryValueKind,
    Setting, Solution, SolutionRegistry, ValueKind,
};
use prefsync_sessions::{ApplyOutcome, ApplySession, CaptureOutcome, CaptureSession};
use serde_json::json;

const INI_PATH: &str = "C:/app/settings.ini";

fn setting(name: &str, kind: ValueKind, handler: HandlerDescription) -> Setting {
    Setting {
        name: name.to_string(),
        kind,
        default: None,
        handler: Some(handler),
        finalizer: None,
    }
}

fn registry() -> SolutionRegistry {
    SolutionRegistry::new(vec![Solution {
        id: "app".to_string(),
        settings: vec![
            setting(
                "blink",
                ValueKind::Integer,
                HandlerDescription::Registry {
                    key_path: r"HKCU\Desktop".to_string(),
                    value_name: "Blink".to_string(),
                    value_kind: RegistryValueKind::Sz,
                },
            ),
            setting(
                "greeting",
                ValueKind::String,
                HandlerDescription::Ini {
                    file_path: INI_PATH.into(),
                    section: "Main".to_string(),
                    key: "Greeting".to_string(),
                },
            ),
            setting(
                "scale",
                ValueKind::Double,
                HandlerDescription::System {
                    setting_id: "display.scale".to_string(),
                },
            ),
        ],
    }])
    .unwrap()
}

fn key(name: &str) -> PreferenceKey {
    PreferenceKey::new("app", name)
}

#[tokio::test]
async fn captured_value_overwrites_preference() {
    let memory = MemoryAdapters::new();
    memory.system.insert("display.scale", json!(1.25));
    let registry = registry();
    let mut prefs = Preferences::new();
    prefs.set(&key("scale"), Some(json!(9.0)));

    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("scale"));
    let report = session.run(&mut prefs).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(prefs.get(&key("scale")), Some(Some(&json!(1.25))));
}

#[tokio::test]
async fn ini_absence_overwrites_with_stored_null() {
    let memory = MemoryAdapters::new();
    let registry = registry();
    let mut prefs = Preferences::new();
    prefs.set(&key("greeting"), Some(json!("old")));

    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("greeting"));
    let report = session.run(&mut prefs).await;

    assert!(matches!(
        report.outcome(&key("greeting")),
        Some(CaptureOutcome::Empty)
    ));
    assert_eq!(prefs.get(&key("greeting")), Some(None));
}

#[tokio::test]
async fn ini_backend_error_preserves_prior_value() {
    let memory = MemoryAdapters::new();
    memory.ini.set_failing(true);
    let registry = registry();
    let mut prefs = Preferences::new();
    prefs.set(&key("greeting"), Some(json!("old")));

    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("greeting"));
    let report = session.run(&mut prefs).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(prefs.get(&key("greeting")), Some(Some(&json!("old"))));
}

#[tokio::test]
async fn system_absence_overwrites_but_error_preserves() {
    let memory = MemoryAdapters::new();
    let registry = registry();
    let mut prefs = Preferences::new();
    prefs.set(&key("scale"), Some(json!(2.0)));

    // Unseeded id: affirmative "no value".
    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("scale"));
    session.run(&mut prefs).await;
    assert_eq!(prefs.get(&key("scale")), Some(None));

    // Backend error: the stored null from the previous pass survives.
    prefs.set(&key("scale"), Some(json!(2.0)));
    memory.system.set_failing(true);
    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("scale"));
    session.run(&mut prefs).await;
    assert_eq!(prefs.get(&key("scale")), Some(Some(&json!(2.0))));
}

#[tokio::test]
async fn registry_capture_failure_always_preserves_prior_value() {
    let memory = MemoryAdapters::new();
    let registry = registry();
    let mut prefs = Preferences::new();
    prefs.set(&key("blink"), Some(json!(530)));

    // Absent value: untouched, not nulled.
    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("blink"));
    session.run(&mut prefs).await;
    assert_eq!(prefs.get(&key("blink")), Some(Some(&json!(530))));

    // Wrong-type value (coercion failure): still untouched.
    memory
        .key_value
        .insert(r"HKCU\Desktop", "Blink", RegistryValue::Sz("garbage".into()));
    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_setting(key("blink"));
    let report = session.run(&mut prefs).await;
    assert_eq!(report.failed(), 1);
    assert_eq!(prefs.get(&key("blink")), Some(Some(&json!(530))));
}

#[tokio::test]
async fn one_failing_setting_never_aborts_the_pass() {
    let memory = MemoryAdapters::new();
    memory.ini.set_failing(true);
    memory.system.insert("display.scale", json!(1.5));
    memory
        .key_value
        .insert(r"HKCU\Desktop", "Blink", RegistryValue::Sz("200".into()));
    let registry = registry();
    let mut prefs = Preferences::new();

    let mut session = CaptureSession::new(&registry, memory.adapters());
    session.add_all_solutions();
    let report = session.run(&mut prefs).await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(prefs.get(&key("blink")), Some(Some(&json!(200))));
    assert_eq!(prefs.get(&key("scale")), Some(Some(&json!(1.5))));
    assert_eq!(prefs.get(&key("greeting")), None);
}

#[tokio::test]
async fn add_solution_rejects_unknown_ids() {
    let memory = MemoryAdapters::new();
    let registry = registry();
    let mut session = CaptureSession::new(&registry, memory.adapters());
    assert!(session.add_solution("app"));
    assert!(!session.add_solution("nope"));
}

fn finalized_registry() -> SolutionRegistry {
    let mut blink = setting(
        "blink",
        ValueKind::Integer,
        HandlerDescription::Registry {
            key_path: r"HKCU\Desktop".to_string(),
            value_name: "Blink".to_string(),
            value_kind: RegistryValueKind::Dword,
        },
    );
    blink.finalizer = Some(FinalizerDescription::SystemParametersInfo {
        action: 4111,
        send_change: true,
        update_user_profile: true,
    });
    SolutionRegistry::new(vec![Solution {
        id: "app".to_string(),
        settings: vec![blink],
    }])
    .unwrap()
}

#[tokio::test]
async fn apply_runs_finalizer_exactly_once_on_success() {
    let memory = MemoryAdapters::new();
    let registry = finalized_registry();

    let session = ApplySession::new(&registry, memory.adapters());
    let report = session.run(vec![(key("blink"), Some(json!(250)))]).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(
        memory.key_value.value(r"HKCU\Desktop", "Blink"),
        Some(RegistryValue::Dword(250))
    );
    assert_eq!(memory.system_parameters.calls(), vec![(4111, true, true)]);
}

#[tokio::test]
async fn apply_failure_skips_the_finalizer() {
    let memory = MemoryAdapters::new();
    memory.key_value.set_failing(true);
    let registry = finalized_registry();

    let session = ApplySession::new(&registry, memory.adapters());
    let report = session.run(vec![(key("blink"), Some(json!(250)))]).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(memory.system_parameters.call_count(), 0);
}

#[tokio::test]
async fn finalizer_failure_is_non_fatal_but_surfaced() {
    let memory = MemoryAdapters::new();
    memory.system_parameters.set_rejecting(true);
    let registry = finalized_registry();

    let session = ApplySession::new(&registry, memory.adapters());
    let report = session.run(vec![(key("blink"), Some(json!(250)))]).await;

    assert_eq!(report.succeeded(), 1);
    assert!(matches!(
        report.outcome(&key("blink")),
        Some(ApplyOutcome::Applied {
            finalizer_failed: true
        })
    ));
}

#[tokio::test]
async fn apply_tolerates_stale_keys_and_stored_nulls() {
    let memory = MemoryAdapters::new();
    let registry = registry();

    let session = ApplySession::new(&registry, memory.adapters());
    let report = session
        .run(vec![
            (PreferenceKey::new("gone", "x"), Some(json!(1))),
            (key("greeting"), None),
            (key("greeting"), Some(json!("hello"))),
        ])
        .await;

    assert!(matches!(
        report.outcome(&PreferenceKey::new("gone", "x")),
        Some(ApplyOutcome::UnknownSetting)
    ));
    assert_eq!(
        memory
            .ini
            .value(std::path::Path::new(INI_PATH), "Main", "Greeting"),
        Some("hello".to_string())
    );
}

#[tokio::test]
async fn one_failing_apply_does_not_affect_others() {
    let memory = MemoryAdapters::new();
    memory.system.set_failing(true);
    let registry = registry();

    let session = ApplySession::new(&registry, memory.adapters());
    let report = session
        .run(vec![
            (key("scale"), Some(json!(1.5))),
            (key("greeting"), Some(json!("hi"))),
        ])
        .await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        memory
            .ini
            .value(std::path::Path::new(INI_PATH), "Main", "Greeting"),
        Some("hi".to_string())
    );
}
