//! Unit tests for the settings store
//!
//! Covers `src/services/settings.rs`: dotted-path access, persistence
//! round trips and the module status namespace.

mod common;
use common::temp_settings;

use kioskd::modules::ModuleStatus;
use kioskd::services::SettingsStore;

// ============================================================================
// Dotted-path access
// ============================================================================

#[test]
fn set_and_get_round_trip() {
    let (store, _dir) = temp_settings();

    store.set("kiosk.url", "https://panel.example/display");
    assert_eq!(
        store.get_str("kiosk.url").as_deref(),
        Some("https://panel.example/display")
    );
}

#[test]
fn nested_keys_create_intermediate_objects() {
    let (store, _dir) = temp_settings();

    store.set("network.wifi.ssid", "kiosk-net");
    store.set("network.wifi.psk", "hunter2");
    store.set("network.interface", "wlan0");

    assert_eq!(store.get_str("network.wifi.ssid").as_deref(), Some("kiosk-net"));
    assert_eq!(store.get_str("network.interface").as_deref(), Some("wlan0"));

    let wifi = store.get("network.wifi").expect("intermediate object");
    assert!(wifi.is_object());
}

#[test]
fn missing_keys_read_as_none() {
    let (store, _dir) = temp_settings();

    assert!(store.get("kiosk.url").is_none());
    assert!(store.get("kiosk").is_none());
}

#[test]
fn defaults_apply_when_key_missing_or_wrong_type() {
    let (store, _dir) = temp_settings();

    assert_eq!(store.get_str_or("network.interface", "eth0"), "eth0");
    assert_eq!(store.get_u64_or("enrollment.poll_interval_secs", 30), 30);

    store.set("network.interface", "enp3s0");
    store.set("enrollment.poll_interval_secs", 5);
    assert_eq!(store.get_str_or("network.interface", "eth0"), "enp3s0");
    assert_eq!(store.get_u64_or("enrollment.poll_interval_secs", 30), 5);

    // Wrong type falls back to the default.
    store.set("enrollment.poll_interval_secs", "soon");
    assert_eq!(store.get_u64_or("enrollment.poll_interval_secs", 30), 30);
}

#[test]
fn setting_below_a_scalar_replaces_it_with_an_object() {
    let (store, _dir) = temp_settings();

    store.set("display", "builtin");
    store.set("display.brightness", 80);

    assert_eq!(
        store.get("display.brightness").and_then(|v| v.as_u64()),
        Some(80)
    );
}

#[test]
fn snapshot_returns_the_full_tree() {
    let (store, _dir) = temp_settings();

    store.set("kiosk.id", "front-desk-01");
    store.set("kiosk.url", "https://panel.example");

    let snapshot = store.snapshot();
    assert_eq!(snapshot["kiosk"]["id"], "front-desk-01");
    assert_eq!(snapshot["kiosk"]["url"], "https://panel.example");
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn persist_and_reload_round_trip() {
    let (store, _dir) = temp_settings();

    store.set("kiosk.id", "front-desk-01");
    store.set("network.interface", "enp3s0");
    store.persist().unwrap();

    let reloaded = SettingsStore::load(store.path()).unwrap();
    assert_eq!(reloaded.get_str("kiosk.id").as_deref(), Some("front-desk-01"));
    assert_eq!(
        reloaded.get_str("network.interface").as_deref(),
        Some("enp3s0")
    );
}

#[test]
fn load_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::load(dir.path().join("does-not-exist.json")).unwrap();
    assert!(store.get("anything").is_none());
}

#[test]
fn load_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(SettingsStore::load(&path).is_err());
}

// ============================================================================
// Module status namespace
// ============================================================================

#[test]
fn unknown_module_status_reads_as_pending() {
    let (store, _dir) = temp_settings();
    assert_eq!(store.module_status("network"), ModuleStatus::Pending);
}

#[test]
fn unparseable_module_status_reads_as_pending() {
    let (store, _dir) = temp_settings();
    store.set("modules.network", "healthy");
    assert_eq!(store.module_status("network"), ModuleStatus::Pending);
}

#[test]
fn module_status_round_trips_through_disk() {
    let (store, _dir) = temp_settings();

    store
        .set_module_status("network", ModuleStatus::Completed)
        .unwrap();
    assert_eq!(store.module_status("network"), ModuleStatus::Completed);

    // A fresh load of the persisted store, as after a process restart.
    let reloaded = SettingsStore::load(store.path()).unwrap();
    assert_eq!(reloaded.module_status("network"), ModuleStatus::Completed);
}

#[test]
fn module_statuses_snapshots_the_requested_names() {
    let (store, _dir) = temp_settings();

    store
        .set_module_status("network", ModuleStatus::Completed)
        .unwrap();
    store
        .set_module_status("docker", ModuleStatus::Failed)
        .unwrap();

    let map = store.module_statuses(["network", "docker", "display"]);
    assert_eq!(map["network"], ModuleStatus::Completed);
    assert_eq!(map["docker"], ModuleStatus::Failed);
    assert_eq!(map["display"], ModuleStatus::Pending);
}
