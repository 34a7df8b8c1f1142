use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dashmap::DashMap;
use led_foot_client::{LedFootApi, LedFootClient, LedFootClientError, LedFootOptions};
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};
use tokio::signal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::entities::{
    EntityPointer, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE, Topics, build_entities,
};
use crate::settings::Settings;
use crate::web::metrics::Metrics;
use crate::web::state::{BridgeState, EntityInfo, ServerStatus};

const MQTT_CHANNEL_CAPACITY: usize = 64;
const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
const MQTT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Base URL of the LED Foot server API.
    pub server: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,
}

/// Entities published on MQTT, routed by command topic.
struct Bridge {
    mqtt: AsyncClient,
    topics: Topics,
    api: Arc<LedFootApi>,
    entities: Vec<EntityPointer>,
    routes: DashMap<String, EntityPointer>,
    state: BridgeState,
    /// Held while a command or a pull touches the cache, so a pull that
    /// started before a command cannot overwrite its result.
    cache_lock: Mutex<()>,
}

impl Bridge {
    fn new(
        mqtt: AsyncClient,
        topics: Topics,
        api: Arc<LedFootApi>,
        entities: Vec<EntityPointer>,
        state: BridgeState,
    ) -> Self {
        let routes = DashMap::new();
        for entity in &entities {
            routes.insert(entity.command_topic(), entity.clone());
            state.register_entity(EntityInfo {
                unique_id: entity.unique_id(),
                name: entity.name(),
                component: entity.component().as_str(),
                status: entity.status(),
                last_update: None,
            });
        }
        let mut counts = std::collections::HashMap::new();
        for entity in &entities {
            *counts.entry(entity.component().as_str()).or_insert(0) += 1;
        }
        for (component, count) in counts {
            Metrics::set_entity_count(component, count);
        }
        Self {
            mqtt,
            topics,
            api,
            entities,
            routes,
            state,
            cache_lock: Mutex::new(()),
        }
    }

    /// Runs after every broker (re)connection, so retained configs survive broker restarts.
    async fn announce(&self) -> Result<()> {
        for entity in &self.entities {
            let topic = self.topics.discovery(entity.component(), &entity.object_id());
            let config = serde_json::to_string(&entity.discovery_config())?;
            self.mqtt
                .publish(topic, QoS::AtLeastOnce, true, config)
                .await
                .context("Failed to publish discovery config")?;
            self.mqtt
                .subscribe(entity.command_topic(), QoS::AtLeastOnce)
                .await
                .context("Failed to subscribe to command topic")?;
        }
        info!("Announced {} entities", self.entities.len());
        let reachable = self.state.summary().server_status != ServerStatus::Unreachable;
        self.set_available(reachable).await?;
        self.publish_states().await
    }

    async fn set_available(&self, available: bool) -> Result<()> {
        let payload = if available {
            PAYLOAD_AVAILABLE
        } else {
            PAYLOAD_NOT_AVAILABLE
        };
        self.mqtt
            .publish(self.topics.availability(), QoS::AtLeastOnce, true, payload)
            .await
            .context("Failed to publish availability")?;
        self.state.set_available(available);
        Ok(())
    }

    async fn publish_state(&self, entity: &EntityPointer) -> Result<()> {
        self.state
            .update_entity_status(&entity.unique_id(), entity.status());
        self.mqtt
            .publish(
                entity.state_topic(),
                QoS::AtLeastOnce,
                true,
                entity.state_payload(),
            )
            .await
            .with_context(|| format!("Failed to publish state of {}", entity.unique_id()))
    }

    async fn publish_states(&self) -> Result<()> {
        for entity in &self.entities {
            self.publish_state(entity).await?;
        }
        Ok(())
    }

    /// Applies a command and echoes the resulting state. Returns false for unrouted topics.
    async fn dispatch(&self, topic: &str, payload: &[u8]) -> bool {
        let Some(entity) = self.routes.get(topic).map(|e| e.value().clone()) else {
            debug!("No entity listens on {topic}");
            return false;
        };
        let component = entity.component().as_str();
        let handled = {
            let _guard = self.cache_lock.lock().await;
            entity.handle_command(payload).await
        };
        match handled {
            Ok(()) => {
                Metrics::record_command(component, true);
                self.state.record_command(Ok(()));
            }
            Err(e) => {
                error!("Command for {} failed: {e:#}", entity.unique_id());
                Metrics::record_command(component, false);
                self.state.record_command(Err(format!("{e:#}")));
            }
        }
        if let Err(e) = self.publish_state(&entity).await {
            error!("{e:#}");
        }
        true
    }

    /// Refreshes the cache and republishes availability and states.
    async fn poll(&self) {
        let pulled = {
            let _guard = self.cache_lock.lock().await;
            self.api.pull_state().await
        };
        match pulled {
            Ok(()) => {
                Metrics::record_poll(true);
                self.state.record_poll(Ok(()));
                let published = match self.set_available(true).await {
                    Ok(()) => self.publish_states().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = published {
                    warn!("{e:#}");
                }
            }
            Err(e) => {
                warn!("Failed to poll the LED Foot server: {e}");
                Metrics::record_poll(false);
                self.state.record_poll(Err(e.to_string()));
                if let Err(e) = self.set_available(false).await {
                    warn!("{e:#}");
                }
            }
        }
    }
}

fn mqtt_options(options: &BridgeOptions, topics: &Topics) -> MqttOptions {
    let client_id = format!("led-foot-bridge-{}", uuid::Uuid::new_v4().simple());
    let mut mqtt_options = MqttOptions::new(client_id, &options.mqtt_host, options.mqtt_port);
    mqtt_options.set_keep_alive(MQTT_KEEP_ALIVE);
    mqtt_options.set_last_will(LastWill::new(
        topics.availability(),
        PAYLOAD_NOT_AVAILABLE,
        QoS::AtLeastOnce,
        true,
    ));
    if let Some(user) = &options.mqtt_user {
        mqtt_options.set_credentials(user, options.mqtt_password.clone().unwrap_or_default());
    }
    mqtt_options
}

/// Drives the MQTT connection until the client disconnects.
fn run_eventloop(mut eventloop: EventLoop, bridge: Arc<Bridge>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to the MQTT broker");
                    bridge.state.set_mqtt_connected(true);
                    Metrics::set_mqtt_connected(true);
                    Metrics::inc_mqtt_reconnects();
                    // publishing from here would block the loop that drains the request queue
                    let bridge = bridge.clone();
                    tokio::spawn(async move {
                        if let Err(e) = bridge.announce().await {
                            error!("{e:#}");
                        }
                    });
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let bridge = bridge.clone();
                    tokio::spawn(async move {
                        bridge.dispatch(&publish.topic, &publish.payload).await;
                    });
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("Disconnected from the MQTT broker");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {e}");
                    bridge.state.set_mqtt_connected(false);
                    Metrics::set_mqtt_connected(false);
                    tokio::time::sleep(MQTT_RETRY_DELAY).await;
                }
            }
        }
        bridge.state.set_mqtt_connected(false);
        Metrics::set_mqtt_connected(false);
    })
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = signal::ctrl_c() => res.context("Failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    Ok(())
}

pub async fn start_bridge(
    options: BridgeOptions,
    settings: Settings,
    bridge_state: BridgeState,
) -> Result<()> {
    let client_options = LedFootOptions::builder()
        .base_url(options.server.clone())
        .build()
        .map_err(|e| LedFootClientError::Generic(e.to_string()))?;
    let api = Arc::new(LedFootApi::new(LedFootClient::new(client_options)?));

    info!("Pulling state from {}", api.client().base_url());
    match api.pull_state().await {
        Ok(()) => bridge_state.record_poll(Ok(())),
        Err(e) => {
            error!("Initial pull failed, starting with defaults: {e}");
            bridge_state.record_poll(Err(e.to_string()));
        }
    }

    let topics = Topics::new(&settings.discovery_prefix, &settings.base_topic);
    let entities = build_entities(&api, &topics, &settings);
    info!("Created {} entities", entities.len());

    let (mqtt, eventloop) =
        AsyncClient::new(mqtt_options(&options, &topics), MQTT_CHANNEL_CAPACITY);
    let bridge = Arc::new(Bridge::new(
        mqtt.clone(),
        topics,
        api,
        entities,
        bridge_state,
    ));
    info!(
        "Connecting to MQTT broker {}:{}",
        options.mqtt_host, options.mqtt_port
    );
    let eventloop_handle = run_eventloop(eventloop, bridge.clone());

    let poller = async {
        let mut interval =
            tokio::time::interval(Duration::from_secs(settings.poll_interval_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately and the cache was just pulled
        interval.tick().await;
        loop {
            interval.tick().await;
            bridge.poll().await;
        }
    };

    tokio::select! {
        _ = poller => {}
        res = shutdown_signal() => {
            res?;
            info!("signal received, starting graceful shutdown");
        }
    }

    if let Err(e) = bridge.set_available(false).await {
        warn!("{e:#}");
    }
    mqtt.disconnect()
        .await
        .context("Failed to disconnect from the MQTT broker")?;
    if tokio::time::timeout(DISCONNECT_TIMEOUT, eventloop_handle)
        .await
        .is_err()
    {
        warn!("MQTT event loop did not stop in time");
    }
    Ok(())
}
