//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                | Connects to              |
//! |------------|---------------------------|--------------------------|
//! | `hardware` | SamplePort, ClimatePort   | ESP32 ADC1, DHT11        |
//! |            | ActuatorPort              | pump relay GPIO          |
//! | `log_sink` | EventSink                 | serial log output        |
//! | `mqtt`     | EventSink (telemetry)     | MQTT broker              |
//! | `nvs`      | ConfigPort                | NVS / in-memory store    |
//! | `time`     | monotonic clock           | esp_timer                |
//! | `wifi`     | station bring-up          | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
