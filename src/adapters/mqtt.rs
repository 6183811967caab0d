//! MQTT transport for commands, replies and telemetry.
//!
//! One broker connection serves three topics: inbound commands on
//! [`COMMAND_TOPIC`], command replies on [`REPLY_TOPIC`] and the periodic
//! telemetry feed on [`TELEMETRY_TOPIC`]. Command handling runs on a
//! dedicated thread that drains the broker event queue; the control loop
//! only ever enqueues telemetry and never blocks on the socket.
//!
//! Only built for `target_os = "espidf"`; host tests exercise the command
//! handling through [`crate::protocol`] directly.

#[cfg(target_os = "espidf")]
mod espidf {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    use esp_idf_svc::mqtt::client::{
        EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{debug, info, warn};

    use crate::adapters::nvs::NvsConfigStore;
    use crate::app::events::AppEvent;
    use crate::app::ports::EventSink;
    use crate::error::{CommsError, Error, Result};
    use crate::protocol::{self, COMMAND_TOPIC, REPLY_TOPIC, TELEMETRY_TOPIC};
    use crate::store::ConfigStore;

    /// Stack for the broker event thread. Command handling parses JSON and
    /// touches NVS, which needs more than the 3 KB thread default.
    const EVENT_THREAD_STACK: usize = 6 * 1024;

    /// Handle on the broker connection shared by the command thread and
    /// the telemetry publisher.
    pub struct MqttLink {
        client: Arc<Mutex<EspMqttClient<'static>>>,
        connected: Arc<AtomicBool>,
    }

    impl MqttLink {
        /// Connects to the broker and spawns the command thread.
        ///
        /// The thread owns the event queue: it flips the connected flag,
        /// (re)subscribes to [`COMMAND_TOPIC`] and answers every command
        /// on [`REPLY_TOPIC`], mutating the live config through `store`.
        pub fn connect(
            broker_url: &str,
            username: Option<&str>,
            password: Option<&str>,
            store: Arc<ConfigStore>,
            config_port: Arc<NvsConfigStore>,
        ) -> Result<Self> {
            let conf = MqttClientConfiguration {
                username,
                password,
                ..MqttClientConfiguration::default()
            };

            let (client, connection) = EspMqttClient::new(broker_url, &conf).map_err(|e| {
                warn!("mqtt client start failed: {e}");
                Error::Comms(CommsError::MqttStartFailed)
            })?;

            let client = Arc::new(Mutex::new(client));
            let connected = Arc::new(AtomicBool::new(false));

            let thread_client = Arc::clone(&client);
            let thread_connected = Arc::clone(&connected);
            std::thread::Builder::new()
                .name("mqtt".into())
                .stack_size(EVENT_THREAD_STACK)
                .spawn(move || {
                    command_loop(
                        connection,
                        &thread_client,
                        &thread_connected,
                        &store,
                        &config_port,
                    );
                })
                .map_err(|e| {
                    warn!("mqtt event thread spawn failed: {e}");
                    Error::Comms(CommsError::MqttStartFailed)
                })?;

            Ok(Self { client, connected })
        }

        /// A cheap clone handle for the control loop's telemetry feed.
        pub fn publisher(&self) -> MqttPublisher {
            MqttPublisher {
                client: Arc::clone(&self.client),
                connected: Arc::clone(&self.connected),
            }
        }
    }

    fn command_loop(
        mut connection: EspMqttConnection,
        client: &Mutex<EspMqttClient<'static>>,
        connected: &AtomicBool,
        store: &ConfigStore,
        config_port: &NvsConfigStore,
    ) {
        while let Ok(event) = connection.next() {
            match event.payload() {
                EventPayload::Connected(_) => {
                    connected.store(true, Ordering::Relaxed);
                    info!("mqtt connected");
                    if let Err(e) = subscribe_commands(client) {
                        warn!("mqtt subscribe failed: {e}");
                    }
                }
                EventPayload::Disconnected => {
                    connected.store(false, Ordering::Relaxed);
                    warn!("mqtt disconnected");
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } if topic == COMMAND_TOPIC => {
                    let reply = match core::str::from_utf8(data) {
                        Ok(payload) => protocol::handle_payload(payload, store, config_port),
                        Err(_) => protocol::Reply::ParseError,
                    };
                    if let Err(e) = publish_reply(client, &reply) {
                        warn!("mqtt reply publish failed: {e}");
                    }
                }
                EventPayload::Received { topic, .. } => {
                    debug!("ignoring message on {topic:?}");
                }
                EventPayload::Error(e) => {
                    warn!("mqtt transport error: {e}");
                }
                other => debug!("mqtt event: {other:?}"),
            }
        }
        // The queue only closes when the client is dropped, which never
        // happens while the firmware is running.
        warn!("mqtt event queue closed");
    }

    fn subscribe_commands(client: &Mutex<EspMqttClient<'static>>) -> Result<()> {
        lock(client)
            .subscribe(COMMAND_TOPIC, QoS::AtMostOnce)
            .map_err(|e| {
                warn!("subscribe {COMMAND_TOPIC}: {e}");
                Error::Comms(CommsError::MqttSubscribeFailed)
            })?;
        info!("subscribed to {COMMAND_TOPIC}");
        Ok(())
    }

    fn publish_reply(
        client: &Mutex<EspMqttClient<'static>>,
        reply: &protocol::Reply,
    ) -> Result<()> {
        let text = reply.wire_text();
        lock(client)
            .publish(REPLY_TOPIC, QoS::AtMostOnce, false, text.as_bytes())
            .map_err(|e| {
                warn!("publish {REPLY_TOPIC}: {e}");
                Error::Comms(CommsError::MqttPublishFailed)
            })?;
        debug!("reply: {text}");
        Ok(())
    }

    fn lock(
        client: &Mutex<EspMqttClient<'static>>,
    ) -> std::sync::MutexGuard<'_, EspMqttClient<'static>> {
        // A poisoned lock only means another thread panicked mid-publish;
        // the client handle itself is still usable.
        client.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Telemetry feed for the control loop.
    ///
    /// Drops frames while the broker is unreachable rather than queueing
    /// them, matching the at-most-once nature of the feed.
    pub struct MqttPublisher {
        client: Arc<Mutex<EspMqttClient<'static>>>,
        connected: Arc<AtomicBool>,
    }

    impl EventSink for MqttPublisher {
        fn emit(&mut self, event: &AppEvent) {
            let AppEvent::Telemetry(snapshot) = event else {
                return;
            };
            if !self.connected.load(Ordering::Relaxed) {
                return;
            }
            let json = snapshot.to_json();
            // enqueue hands the frame to the broker task; publish would
            // block the control loop on a slow socket.
            if let Err(e) = lock(&self.client).enqueue(
                TELEMETRY_TOPIC,
                QoS::AtMostOnce,
                false,
                json.as_bytes(),
            ) {
                warn!("telemetry enqueue failed: {e}");
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use espidf::{MqttLink, MqttPublisher};
