//! Remote configuration protocol.
//!
//! The controller listens for text payloads on the command topic and
//! answers every one of them on the reply topic:
//!
//! * `query…` — any payload with that prefix — answers with the live
//!   configuration as JSON, thresholds converted back to ratios.
//! * anything else is treated as a JSON config update:
//!   `{"config":{"low_moisture":0.80,…,"dry_hold_period_s":300}}`.
//!
//! Reply strings are fixed wire text; operator tooling matches on them
//! verbatim.  Thresholds travel as ratios of the dry→wet calibration
//! span and are stored as raw ADC counts.

use log::{debug, warn};
use serde::Deserialize;

use crate::app::ports::ConfigPort;
use crate::config::{ConfigInvariant, IrrigationConfig, ratio_from_raw, raw_from_ratio};
use crate::error::{Error, ParseError};
use crate::store::ConfigStore;

/// Inbound command topic (subscribe).
pub const COMMAND_TOPIC: &str = "/topic/qos0";
/// Reply topic for command responses (publish).
pub const REPLY_TOPIC: &str = "/topic/qos1";
/// Periodic telemetry topic (publish).
pub const TELEMETRY_TOPIC: &str = "/test/test";

// ───────────────────────────────────────────────────────────────
// Replies
// ───────────────────────────────────────────────────────────────

/// Outcome of one inbound payload, ready to publish on
/// [`REPLY_TOPIC`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Config update validated, applied and persisted.
    Accepted,
    /// Current configuration, rendered as JSON.
    Query(String),
    /// Payload was not valid JSON at all.
    ParseError,
    /// Valid JSON but the `config` object is absent, or fields are
    /// missing or mistyped.
    RejectedParseFailed,
    /// Fields decoded but the values fail the sanity check.
    RejectedSanityCheck,
    /// Config was valid but could not be made durable; the previous
    /// configuration stays live.
    PersistFailed,
}

impl Reply {
    /// Exact bytes to publish on the reply topic.
    pub fn wire_text(&self) -> &str {
        match self {
            Self::Accepted => "CONFIG ACCEPTED",
            Self::Query(body) => body,
            Self::ParseError => "JSON PARSE ERROR",
            Self::RejectedParseFailed => "CONFIG REJECTED - Parse Failed",
            Self::RejectedSanityCheck => "CONFIG REJECTED - Failed sanity check",
            Self::PersistFailed => "CONFIG REJECTED - Persist Failed",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound payload shape
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdateEnvelope {
    config: RatioConfig,
}

/// The over-the-wire configuration: thresholds as calibration ratios,
/// periods in whole seconds.
#[derive(Debug, Deserialize)]
struct RatioConfig {
    low_moisture: f64,
    watered_moisture: f64,
    high_moisture: f64,
    polling_period_s: i64,
    pump_on_period_s: i64,
    pump_off_period_s: i64,
    wet_hold_period_s: i64,
    dry_hold_period_s: i64,
}

impl RatioConfig {
    /// The sanity check runs in the ratio domain, before any
    /// conversion: thresholds ordered, every period positive and small
    /// enough to fit the stored 16-bit seconds fields.
    fn sanity_check(&self) -> Result<(), ConfigInvariant> {
        if !(self.low_moisture < self.watered_moisture
            && self.watered_moisture <= self.high_moisture)
        {
            return Err(ConfigInvariant::ThresholdOrder);
        }
        for period in [
            self.polling_period_s,
            self.pump_on_period_s,
            self.pump_off_period_s,
            self.wet_hold_period_s,
            self.dry_hold_period_s,
        ] {
            if !(1..=i64::from(u16::MAX)).contains(&period) {
                return Err(ConfigInvariant::PeriodRange);
            }
        }
        Ok(())
    }

    /// Ratio → raw conversion.  Must only run after
    /// [`sanity_check`](Self::sanity_check); the period casts rely on
    /// the range check.
    fn to_raw(&self) -> IrrigationConfig {
        IrrigationConfig {
            low_moisture: raw_from_ratio(self.low_moisture as f32),
            watered_moisture: raw_from_ratio(self.watered_moisture as f32),
            high_moisture: raw_from_ratio(self.high_moisture as f32),
            polling_period_s: self.polling_period_s as u16,
            pump_on_period_s: self.pump_on_period_s as u16,
            pump_off_period_s: self.pump_off_period_s as u16,
            wet_hold_period_s: self.wet_hold_period_s as u16,
            dry_hold_period_s: self.dry_hold_period_s as u16,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Handler
// ───────────────────────────────────────────────────────────────

/// Process one inbound payload and produce the reply to publish.
///
/// Every payload gets exactly one reply.  An accepted update is live
/// and durable by the time [`Reply::Accepted`] is returned; any
/// failure leaves the previous configuration untouched.
pub fn handle_payload(payload: &str, store: &ConfigStore, port: &impl ConfigPort) -> Reply {
    debug!("inbound command payload ({} bytes)", payload.len());

    if payload.starts_with("query") {
        return Reply::Query(render_config(&store.snapshot()));
    }

    let candidate = match parse_update(payload) {
        Ok(candidate) => candidate,
        Err(Error::Parse(ParseError::MalformedJson)) => {
            warn!("command payload is not JSON");
            return Reply::ParseError;
        }
        Err(Error::Parse(ParseError::WrongShape)) => {
            warn!("command payload has wrong shape");
            return Reply::RejectedParseFailed;
        }
        Err(e) => {
            warn!("config update rejected: {e}");
            return Reply::RejectedSanityCheck;
        }
    };

    match store.apply_and_persist(candidate, port) {
        Ok(()) => Reply::Accepted,
        Err(Error::Validation(violation)) => {
            warn!("config update rejected: {violation}");
            Reply::RejectedSanityCheck
        }
        Err(e) => {
            warn!("config update not persisted: {e}");
            Reply::PersistFailed
        }
    }
}

/// Decode and sanity-check an update payload into a raw-counts
/// candidate.
fn parse_update(payload: &str) -> crate::error::Result<IrrigationConfig> {
    // Two stages so "not JSON" and "not the shape we expect" produce
    // their distinct replies.
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|_| ParseError::MalformedJson)?;
    let envelope: UpdateEnvelope =
        serde_json::from_value(value).map_err(|_| ParseError::WrongShape)?;

    envelope.config.sanity_check()?;
    Ok(envelope.config.to_raw())
}

/// Render the live configuration for a query reply, thresholds as
/// two-decimal ratios. Also used for the boot report.
pub fn render_config(config: &IrrigationConfig) -> String {
    format!(
        concat!(
            "{{\"config\":{{",
            "\"low_moisture\":{:.2},",
            "\"watered_moisture\":{:.2},",
            "\"high_moisture\":{:.2},",
            "\"polling_period_s\":{},",
            "\"pump_on_period_s\":{},",
            "\"pump_off_period_s\":{},",
            "\"wet_hold_period_s\":{},",
            "\"dry_hold_period_s\":{}",
            "}}}}"
        ),
        ratio_from_raw(config.low_moisture),
        ratio_from_raw(config.watered_moisture),
        ratio_from_raw(config.high_moisture),
        config.polling_period_s,
        config.pump_on_period_s,
        config.pump_off_period_s,
        config.wet_hold_period_s,
        config.dry_hold_period_s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::StorageError;
    use std::cell::Cell;

    #[derive(Default)]
    struct SaveProbe {
        fail_save: Cell<bool>,
        saves: Cell<usize>,
    }

    impl ConfigPort for SaveProbe {
        fn load(&self) -> Result<IrrigationConfig, StorageError> {
            Err(StorageError::NotFound)
        }

        fn save(&self, _config: &IrrigationConfig) -> Result<(), StorageError> {
            if self.fail_save.get() {
                return Err(StorageError::WriteFailed);
            }
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    fn update_json() -> String {
        serde_json::json!({
            "config": {
                "low_moisture": 0.5,
                "watered_moisture": 0.6,
                "high_moisture": 0.7,
                "polling_period_s": 20,
                "pump_on_period_s": 2,
                "pump_off_period_s": 58,
                "wet_hold_period_s": 900,
                "dry_hold_period_s": 120,
            }
        })
        .to_string()
    }

    #[test]
    fn valid_update_is_accepted_applied_and_persisted() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        let reply = handle_payload(&update_json(), &store, &port);
        assert_eq!(reply, Reply::Accepted);
        assert_eq!(reply.wire_text(), "CONFIG ACCEPTED");
        assert_eq!(port.saves.get(), 1);

        let live = store.snapshot();
        assert_eq!(live.low_moisture, raw_from_ratio(0.5));
        assert_eq!(live.watered_moisture, raw_from_ratio(0.6));
        assert_eq!(live.high_moisture, raw_from_ratio(0.7));
        assert_eq!(live.polling_period_s, 20);
        assert_eq!(live.wet_hold_period_s, 900);
    }

    #[test]
    fn query_returns_the_live_config_as_json() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        let reply = handle_payload("query", &store, &port);
        let Reply::Query(body) = reply else {
            panic!("expected query reply");
        };

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let config = &value["config"];
        assert!((config["low_moisture"].as_f64().unwrap() - 0.80).abs() < 0.005);
        assert!((config["watered_moisture"].as_f64().unwrap() - 0.92).abs() < 0.005);
        assert!((config["high_moisture"].as_f64().unwrap() - 0.93).abs() < 0.005);
        assert_eq!(config["polling_period_s"].as_i64().unwrap(), 10);
        assert_eq!(config["pump_on_period_s"].as_i64().unwrap(), 1);
        assert_eq!(config["pump_off_period_s"].as_i64().unwrap(), 59);
        assert_eq!(config["wet_hold_period_s"].as_i64().unwrap(), 1800);
        assert_eq!(config["dry_hold_period_s"].as_i64().unwrap(), 300);

        // Ratios are rendered with two decimals.
        assert!(body.contains("\"low_moisture\":0.80"), "{body}");
    }

    #[test]
    fn query_matches_on_prefix_like_the_original_tooling() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        assert!(matches!(
            handle_payload("query please", &store, &port),
            Reply::Query(_)
        ));
    }

    #[test]
    fn garbage_payload_is_a_parse_error() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        let reply = handle_payload("{\"config\": nope", &store, &port);
        assert_eq!(reply, Reply::ParseError);
        assert_eq!(reply.wire_text(), "JSON PARSE ERROR");
        assert_eq!(store.snapshot(), IrrigationConfig::default());
    }

    #[test]
    fn valid_json_without_config_object_is_rejected_as_parse_failure() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        for payload in ["{}", "null", "[1,2,3]", "{\"config\": 42}"] {
            let reply = handle_payload(payload, &store, &port);
            assert_eq!(reply, Reply::RejectedParseFailed, "payload {payload}");
            assert_eq!(reply.wire_text(), "CONFIG REJECTED - Parse Failed");
        }
    }

    #[test]
    fn missing_or_mistyped_field_is_rejected_as_parse_failure() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();

        let mut missing: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        missing["config"]
            .as_object_mut()
            .unwrap()
            .remove("pump_on_period_s");
        assert_eq!(
            handle_payload(&missing.to_string(), &store, &port),
            Reply::RejectedParseFailed
        );

        let mut mistyped: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        mistyped["config"]["polling_period_s"] = serde_json::json!("ten");
        assert_eq!(
            handle_payload(&mistyped.to_string(), &store, &port),
            Reply::RejectedParseFailed
        );

        // Fractional seconds do not fit the integer period fields.
        let mut fractional: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        fractional["config"]["polling_period_s"] = serde_json::json!(5.5);
        assert_eq!(
            handle_payload(&fractional.to_string(), &store, &port),
            Reply::RejectedParseFailed
        );

        assert_eq!(port.saves.get(), 0);
    }

    #[test]
    fn unordered_thresholds_fail_the_sanity_check() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();

        let mut equal: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        equal["config"]["watered_moisture"] = serde_json::json!(0.5);
        let reply = handle_payload(&equal.to_string(), &store, &port);
        assert_eq!(reply, Reply::RejectedSanityCheck);
        assert_eq!(reply.wire_text(), "CONFIG REJECTED - Failed sanity check");

        let mut above: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        above["config"]["watered_moisture"] = serde_json::json!(0.95);
        assert_eq!(
            handle_payload(&above.to_string(), &store, &port),
            Reply::RejectedSanityCheck
        );
        assert_eq!(store.snapshot(), IrrigationConfig::default());
    }

    #[test]
    fn watered_equal_to_high_passes_the_sanity_check() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        let mut payload: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        payload["config"]["watered_moisture"] = serde_json::json!(0.7);
        assert_eq!(
            handle_payload(&payload.to_string(), &store, &port),
            Reply::Accepted
        );
    }

    #[test]
    fn out_of_range_periods_fail_the_sanity_check() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        for bad in [0i64, -5, 70_000] {
            let mut payload: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
            payload["config"]["wet_hold_period_s"] = serde_json::json!(bad);
            assert_eq!(
                handle_payload(&payload.to_string(), &store, &port),
                Reply::RejectedSanityCheck,
                "period {bad}"
            );
        }
        assert_eq!(port.saves.get(), 0);
    }

    #[test]
    fn ratios_collapsing_to_equal_counts_fail_the_sanity_check() {
        // Ordered in the ratio domain, but truncation maps both to the
        // same raw count.
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        let mut payload: serde_json::Value = serde_json::from_str(&update_json()).unwrap();
        payload["config"]["low_moisture"] = serde_json::json!(0.800);
        payload["config"]["watered_moisture"] = serde_json::json!(0.80001);
        payload["config"]["high_moisture"] = serde_json::json!(0.93);
        assert_eq!(
            handle_payload(&payload.to_string(), &store, &port),
            Reply::RejectedSanityCheck
        );
        assert_eq!(port.saves.get(), 0);
    }

    #[test]
    fn persist_failure_keeps_previous_config_and_reports_it() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        port.fail_save.set(true);
        let reply = handle_payload(&update_json(), &store, &port);
        assert_eq!(reply, Reply::PersistFailed);
        assert_eq!(reply.wire_text(), "CONFIG REJECTED - Persist Failed");
        assert_eq!(store.snapshot(), IrrigationConfig::default());
    }

    #[test]
    fn accepted_update_is_readable_back_through_query() {
        let store = ConfigStore::new(IrrigationConfig::default());
        let port = SaveProbe::default();
        assert_eq!(handle_payload(&update_json(), &store, &port), Reply::Accepted);

        let Reply::Query(body) = handle_payload("query", &store, &port) else {
            panic!("expected query reply");
        };
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!((value["config"]["low_moisture"].as_f64().unwrap() - 0.5).abs() < 0.005);
        assert_eq!(value["config"]["polling_period_s"].as_i64().unwrap(), 20);
    }
}
