//! Remote command protocol against a live store and a mock NVS.
//!
//! These tests exercise the whole command path the way the MQTT event
//! thread does: payload in, fixed wire text out, configuration applied
//! and persisted (or provably untouched).

use plantwater::config::{IrrigationConfig, raw_from_ratio};
use plantwater::protocol::{Reply, handle_payload};
use plantwater::store::{self, ConfigStore};

use crate::mock_hw::MemoryConfig;

fn update_json() -> String {
    serde_json::json!({
        "config": {
            "low_moisture": 0.70,
            "watered_moisture": 0.80,
            "high_moisture": 0.85,
            "polling_period_s": 5,
            "pump_on_period_s": 2,
            "pump_off_period_s": 30,
            "wet_hold_period_s": 600,
            "dry_hold_period_s": 60,
        }
    })
    .to_string()
}

// ── Accept path ───────────────────────────────────────────────

#[test]
fn an_accepted_update_is_acknowledged_and_stored_in_raw_counts() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();

    let reply = handle_payload(&update_json(), &store, &nvs);
    assert_eq!(reply.wire_text(), "CONFIG ACCEPTED");
    assert_eq!(nvs.saves.get(), 1);

    // Ratios cross the wire; raw ADC counts land in storage.
    let stored = nvs.stored().unwrap();
    assert_eq!(stored.low_moisture, raw_from_ratio(0.70));
    assert_eq!(stored.watered_moisture, raw_from_ratio(0.80));
    assert_eq!(stored.high_moisture, raw_from_ratio(0.85));
    assert_eq!(stored.polling_period_s, 5);
    assert_eq!(stored.wet_hold_period_s, 600);
    assert_eq!(stored, store.snapshot());
}

#[test]
fn the_stored_config_survives_a_reboot() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();
    assert_eq!(handle_payload(&update_json(), &store, &nvs), Reply::Accepted);

    // Reboot: a fresh store hydrated from the same record.
    let restored = store::load_or_default(&nvs);
    assert_eq!(restored, store.snapshot());
    assert_eq!(restored.pump_off_period_s, 30);
}

// ── Reject paths ──────────────────────────────────────────────

#[test]
fn rejection_strings_match_the_legacy_controller() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();

    let garbage = handle_payload("definitely not json", &store, &nvs);
    assert_eq!(garbage.wire_text(), "JSON PARSE ERROR");

    let wrong_shape = handle_payload(r#"{"settings":{}}"#, &store, &nvs);
    assert_eq!(wrong_shape.wire_text(), "CONFIG REJECTED - Parse Failed");

    let mut unordered: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
    unordered["config"]["low_moisture"] = serde_json::json!(0.99);
    let insane = handle_payload(&unordered.to_string(), &store, &nvs);
    assert_eq!(
        insane.wire_text(),
        "CONFIG REJECTED - Failed sanity check"
    );

    nvs.fail_save.set(true);
    let unsaved = handle_payload(&update_json(), &store, &nvs);
    assert_eq!(unsaved.wire_text(), "CONFIG REJECTED - Persist Failed");
}

#[test]
fn rejected_updates_leave_no_trace() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();

    for payload in ["not json", r#"{"settings":{}}"#, "[]"] {
        handle_payload(payload, &store, &nvs);
    }
    nvs.fail_save.set(true);
    handle_payload(&update_json(), &store, &nvs);

    assert_eq!(store.snapshot(), IrrigationConfig::default());
    assert_eq!(nvs.saves.get(), 0);
    assert!(nvs.stored().is_none());
}

#[test]
fn a_persist_failure_keeps_the_previous_config_live() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();
    nvs.fail_save.set(true);

    let reply = handle_payload(&update_json(), &store, &nvs);
    assert_eq!(reply, Reply::PersistFailed);

    // The candidate was rolled back, not left half-applied.
    assert_eq!(store.snapshot(), IrrigationConfig::default());

    // Clearing the fault lets the same payload through.
    nvs.fail_save.set(false);
    assert_eq!(handle_payload(&update_json(), &store, &nvs), Reply::Accepted);
    assert_eq!(store.snapshot().polling_period_s, 5);
}

// ── Query path ────────────────────────────────────────────────

#[test]
fn a_query_reports_the_live_config_without_touching_storage() {
    let store = ConfigStore::new(IrrigationConfig::default());
    let nvs = MemoryConfig::empty();

    let Reply::Query(body) = handle_payload("query", &store, &nvs) else {
        panic!("expected a query reply");
    };
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["config"].as_object().unwrap().len(), 8);
    assert_eq!(nvs.saves.get(), 0);

    // After an update the query reflects the new values.
    assert_eq!(handle_payload(&update_json(), &store, &nvs), Reply::Accepted);
    let Reply::Query(after) = handle_payload("query", &store, &nvs) else {
        panic!("expected a query reply");
    };
    assert!(after.contains("\"low_moisture\":0.70"), "{after}");
    assert!(after.contains("\"polling_period_s\":5"), "{after}");
}

// ── Boot-time fallback ────────────────────────────────────────

#[test]
fn corrupt_storage_falls_back_to_compiled_defaults() {
    let nvs = MemoryConfig::empty();
    nvs.fail_load.set(true);
    assert_eq!(store::load_or_default(&nvs), IrrigationConfig::default());
}

#[test]
fn first_boot_runs_on_compiled_defaults() {
    let nvs = MemoryConfig::empty();
    assert_eq!(store::load_or_default(&nvs), IrrigationConfig::default());
}
