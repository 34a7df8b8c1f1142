//! State shared between the bridge runtime and the web server.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

/// Reachability of the LED Foot server, as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Unknown,
    Reachable,
    Unreachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub unique_id: String,
    pub name: String,
    pub component: &'static str,
    pub status: String,
    #[serde(skip)]
    pub last_update: Option<Instant>,
}

#[derive(Debug)]
struct BridgeStateInner {
    start_time: Instant,
    server_url: String,
    poll_interval: Duration,
    server_status: ServerStatus,
    mqtt_connected: bool,
    available: Option<bool>,
    entities: BTreeMap<String, EntityInfo>,
    last_poll: Option<Instant>,
    poll_count: u64,
    poll_failures: u64,
    command_count: u64,
    command_failures: u64,
    last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BridgeState {
    inner: Arc<RwLock<BridgeStateInner>>,
}

impl BridgeState {
    pub fn new(server_url: &str, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BridgeStateInner {
                start_time: Instant::now(),
                server_url: server_url.to_string(),
                poll_interval,
                server_status: ServerStatus::Unknown,
                mqtt_connected: false,
                available: None,
                entities: BTreeMap::new(),
                last_poll: None,
                poll_count: 0,
                poll_failures: 0,
                command_count: 0,
                command_failures: 0,
                last_error: None,
            })),
        }
    }

    pub fn start_time(&self) -> Instant {
        self.inner.read().start_time
    }

    pub fn set_mqtt_connected(&self, connected: bool) {
        self.inner.write().mqtt_connected = connected;
    }

    /// Last availability published on MQTT.
    pub fn set_available(&self, available: bool) {
        self.inner.write().available = Some(available);
    }

    pub fn register_entity(&self, entity: EntityInfo) {
        self.inner
            .write()
            .entities
            .insert(entity.unique_id.clone(), entity);
    }

    /// Unknown ids are ignored.
    pub fn update_entity_status(&self, unique_id: &str, status: String) {
        if let Some(entity) = self.inner.write().entities.get_mut(unique_id) {
            entity.status = status;
            entity.last_update = Some(Instant::now());
        }
    }

    pub fn entities(&self) -> Vec<EntityInfo> {
        self.inner.read().entities.values().cloned().collect()
    }

    /// Records one poll of the server and updates its reachability.
    pub fn record_poll(&self, result: Result<(), String>) {
        let mut inner = self.inner.write();
        inner.poll_count += 1;
        match result {
            Ok(()) => {
                inner.last_poll = Some(Instant::now());
                inner.server_status = ServerStatus::Reachable;
            }
            Err(e) => {
                inner.poll_failures += 1;
                inner.server_status = ServerStatus::Unreachable;
                inner.last_error = Some(e);
            }
        }
    }

    pub fn record_command(&self, result: Result<(), String>) {
        let mut inner = self.inner.write();
        inner.command_count += 1;
        if let Err(e) = result {
            inner.command_failures += 1;
            inner.last_error = Some(e);
        }
    }

    pub fn summary(&self) -> BridgeStateSummary {
        let inner = self.inner.read();
        let mut entity_counts = BTreeMap::new();
        for entity in inner.entities.values() {
            *entity_counts.entry(entity.component).or_insert(0) += 1;
        }
        BridgeStateSummary {
            uptime_seconds: inner.start_time.elapsed().as_secs(),
            server_url: inner.server_url.clone(),
            poll_interval_secs: inner.poll_interval.as_secs(),
            server_status: inner.server_status,
            mqtt_connected: inner.mqtt_connected,
            available: inner.available,
            entity_count: inner.entities.len(),
            entity_counts,
            last_poll_seconds_ago: inner.last_poll.map(|t| t.elapsed().as_secs()),
            poll_count: inner.poll_count,
            poll_failures: inner.poll_failures,
            command_count: inner.command_count,
            command_failures: inner.command_failures,
            last_error: inner.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeStateSummary {
    pub uptime_seconds: u64,
    pub server_url: String,
    pub poll_interval_secs: u64,
    pub server_status: ServerStatus,
    pub mqtt_connected: bool,
    pub available: Option<bool>,
    pub entity_count: usize,
    pub entity_counts: BTreeMap<&'static str, usize>,
    pub last_poll_seconds_ago: Option<u64>,
    pub poll_count: u64,
    pub poll_failures: u64,
    pub command_count: u64,
    pub command_failures: u64,
    pub last_error: Option<String>,
}

impl BridgeStateSummary {
    /// Healthy while the last successful poll is at most three intervals old.
    pub fn is_healthy(&self) -> bool {
        let window = self.poll_interval_secs.max(1) * 3;
        self.last_poll_seconds_ago.is_some_and(|ago| ago <= window)
    }

    pub fn uptime_display(&self) -> String {
        let secs = self.uptime_seconds;
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        if days > 0 {
            format!("{days}d {hours}h {mins}m {secs}s")
        } else if hours > 0 {
            format!("{hours}h {mins}m {secs}s")
        } else if mins > 0 {
            format!("{mins}m {secs}s")
        } else {
            format!("{secs}s")
        }
    }
}
