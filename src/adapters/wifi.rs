//! WiFi station bring-up.
//!
//! Credentials are compiled in (the build environment stands in for the
//! menuconfig step of the IDF original). The ESP-IDF driver handles
//! reconnection after the initial association; this module only brings
//! the station up far enough for MQTT to take over.
//!
//! Only built for `target_os = "espidf"`.

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{
        AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi,
    };
    use log::{info, warn};

    use crate::error::{CommsError, Error, Result};

    /// Builds the station driver and blocks until DHCP has an address.
    pub fn connect_station(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs_partition: EspDefaultNvsPartition,
        ssid: &str,
        password: &str,
    ) -> Result<BlockingWifi<EspWifi<'static>>> {
        let esp_wifi =
            EspWifi::new(modem, sysloop.clone(), Some(nvs_partition)).map_err(comms_err)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(comms_err)?;

        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|()| {
                warn!("ssid longer than 32 bytes");
                Error::Comms(CommsError::WifiConnectFailed)
            })?,
            password: password.try_into().map_err(|()| {
                warn!("password longer than 64 bytes");
                Error::Comms(CommsError::WifiConnectFailed)
            })?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..ClientConfiguration::default()
        });

        wifi.set_configuration(&conf).map_err(comms_err)?;
        wifi.start().map_err(comms_err)?;
        info!("wifi started, associating with '{ssid}'");

        wifi.connect().map_err(comms_err)?;
        wifi.wait_netif_up().map_err(comms_err)?;

        match wifi.wifi().sta_netif().get_ip_info() {
            Ok(ip) => info!("wifi up, ip={}", ip.ip),
            Err(e) => warn!("wifi up, ip query failed: {e}"),
        }

        Ok(wifi)
    }

    fn comms_err(e: esp_idf_svc::sys::EspError) -> Error {
        warn!("wifi bring-up failed: {e}");
        Error::Comms(CommsError::WifiConnectFailed)
    }
}

#[cfg(target_os = "espidf")]
pub use espidf::connect_station;
