//! PlantWater Firmware — Main Entry Point
//!
//! Hexagonal architecture around a 100 ms control tick.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter      LogEventSink    NvsConfigStore         │
//! │  (Sample+Climate+     (EventSink)     (ConfigPort)           │
//! │   Actuator)                                                  │
//! │  MqttLink             Esp32TimeAdapter                       │
//! │  (commands+telemetry) (monotonic clock)                      │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │            ControlService (pure logic)             │      │
//! │  │  FSM · median polling · pump interlock             │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  ConfigStore (live config, shared with the MQTT thread)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
pub mod error;
pub mod median;
pub mod pins;
pub mod protocol;
pub mod safety;
pub mod store;

pub mod adapters;
pub mod app;
pub mod drivers;
pub mod fsm;
pub mod sensors;

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::nvs::NvsConfigStore;
use adapters::time::Esp32TimeAdapter;
use app::events::AppEvent;
use app::ports::EventSink;
use app::service::ControlService;
use store::ConfigStore;

#[cfg(target_os = "espidf")]
use adapters::mqtt::{MqttLink, MqttPublisher};
#[cfg(target_os = "espidf")]
use esp_idf_svc::eventloop::EspSystemEventLoop;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripherals::Peripherals;
#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::EspDefaultNvsPartition;
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

/// Control loop cadence. Poll and state periods are multiples of this.
const CONTROL_TICK_MS: u64 = 100;

// ── Compiled-in network settings ──────────────────────────────
//
// The build environment stands in for menuconfig. Leave the SSID unset
// to run the controller offline.

const WIFI_SSID: &str = match option_env!("PLANTWATER_WIFI_SSID") {
    Some(v) => v,
    None => "",
};
const WIFI_PASS: &str = match option_env!("PLANTWATER_WIFI_PASS") {
    Some(v) => v,
    None => "",
};
const MQTT_BROKER_URL: &str = match option_env!("PLANTWATER_MQTT_URL") {
    Some(v) => v,
    None => "mqtt://mqtt.eclipseprojects.io",
};
const MQTT_USERNAME: Option<&str> = option_env!("PLANTWATER_MQTT_USER");
const MQTT_PASSWORD: Option<&str> = option_env!("PLANTWATER_MQTT_PASS");

// ── Event fan-out ─────────────────────────────────────────────
//
// The control loop emits into one sink; this bridges it to the serial
// log and, when the broker is up, the telemetry topic.

struct BoardSink {
    log: LogEventSink,
    #[cfg(target_os = "espidf")]
    mqtt: Option<MqttPublisher>,
}

impl EventSink for BoardSink {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        #[cfg(target_os = "espidf")]
        if let Some(mqtt) = self.mqtt.as_mut() {
            mqtt.emit(event);
        }
    }
}

// ── Network bring-up ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn connect_wifi() -> Result<BlockingWifi<EspWifi<'static>>> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    adapters::wifi::connect_station(
        peripherals.modem,
        sysloop,
        nvs_partition,
        WIFI_SSID,
        WIFI_PASS,
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Brings up WiFi and MQTT, degrading to offline operation when either
/// fails. Watering must keep working with the network down.
#[cfg(target_os = "espidf")]
fn bring_up_network(
    store: &Arc<ConfigStore>,
    nvs: &Arc<NvsConfigStore>,
) -> (Option<BlockingWifi<EspWifi<'static>>>, Option<MqttPublisher>) {
    if WIFI_SSID.is_empty() {
        warn!("no WiFi credentials compiled in, running offline");
        return (None, None);
    }

    let wifi = match connect_wifi() {
        Ok(w) => w,
        Err(e) => {
            warn!("WiFi bring-up failed ({e}), running offline");
            return (None, None);
        }
    };

    let link = match MqttLink::connect(
        MQTT_BROKER_URL,
        MQTT_USERNAME,
        MQTT_PASSWORD,
        Arc::clone(store),
        Arc::clone(nvs),
    ) {
        Ok(l) => l,
        Err(e) => {
            warn!("MQTT bring-up failed ({e}), running without remote control");
            return (Some(wifi), None);
        }
    };

    (Some(wifi), Some(link.publisher()))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PlantWater v{} starting", env!("CARGO_PKG_VERSION"));
    info!("free heap: {} bytes", drivers::hw_init::free_heap_bytes());

    // ── 2. Hardware peripherals ───────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical; hold the pump line parked
        // and wait for the watchdog reset.
        log::error!("HAL init failed: {e} — halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let nvs = match NvsConfigStore::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({e}), running with defaults and no persistence");
            NvsConfigStore::default()
        }
    };
    let nvs = Arc::new(nvs);

    let boot_config = store::load_or_default(nvs.as_ref());
    info!("active config: {}", protocol::render_config(&boot_config));
    let config_store = Arc::new(ConfigStore::new(boot_config));

    // ── 4. Network (WiFi + MQTT) ──────────────────────────────
    #[cfg(target_os = "espidf")]
    let (_wifi, mqtt_publisher) = bring_up_network(&config_store, &nvs);

    let mut sink = BoardSink {
        log: LogEventSink::new(),
        #[cfg(target_os = "espidf")]
        mqtt: mqtt_publisher,
    };

    // ── 5. Control loop ───────────────────────────────────────
    let mut hw = HardwareAdapter::new();
    let clock = Esp32TimeAdapter::new();
    let mut service = ControlService::new(
        Arc::clone(&config_store),
        drivers::hw_init::free_heap_bytes,
    );

    info!("entering control loop ({CONTROL_TICK_MS} ms tick)");
    loop {
        service.tick(clock.uptime_us(), &mut hw, &mut sink);
        std::thread::sleep(Duration::from_millis(CONTROL_TICK_MS));
    }
}
