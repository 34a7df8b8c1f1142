mod light;
mod switch;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use led_foot_client::LedFootApi;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::settings::Settings;

pub(crate) use light::LedFootLight;
pub(crate) use switch::LedFootRoom;

pub(crate) const MANUFACTURER: &str = "Kind Digits";
pub(crate) const PAYLOAD_ON: &str = "ON";
pub(crate) const PAYLOAD_OFF: &str = "OFF";
pub(crate) const PAYLOAD_AVAILABLE: &str = "online";
pub(crate) const PAYLOAD_NOT_AVAILABLE: &str = "offline";

pub type EntityPointer = Arc<dyn LedFootEntity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Light,
    Switch,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Light => "light",
            Component::Switch => "switch",
        }
    }
}

/// Device block of a discovery config.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
}

/// Topic layout shared by all entities.
#[derive(Debug, Clone)]
pub struct Topics {
    discovery_prefix: String,
    base: String,
}

impl Topics {
    pub fn new(discovery_prefix: &str, base: &str) -> Self {
        Self {
            discovery_prefix: discovery_prefix.trim_end_matches('/').to_string(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn availability(&self) -> String {
        format!("{}/status", self.base)
    }

    pub fn light_state(&self) -> String {
        format!("{}/light/state", self.base)
    }

    pub fn light_command(&self) -> String {
        format!("{}/light/set", self.base)
    }

    pub fn room_state(&self, room_id: &str) -> String {
        format!("{}/room/{}/state", self.base, sanitize(room_id))
    }

    pub fn room_command(&self, room_id: &str) -> String {
        format!("{}/room/{}/set", self.base, sanitize(room_id))
    }

    pub fn discovery(&self, component: Component, object_id: &str) -> String {
        format!(
            "{}/{}/{}/config",
            self.discovery_prefix,
            component.as_str(),
            object_id
        )
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing everything else with `_` so ids are safe in topics.
pub(crate) fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A Home Assistant entity backed by the shared [`LedFootApi`] cache.
#[async_trait]
pub trait LedFootEntity: Send + Sync {
    fn unique_id(&self) -> String;

    fn name(&self) -> String;

    fn component(&self) -> Component;

    /// Id used in the discovery topic.
    fn object_id(&self) -> String;

    fn command_topic(&self) -> String;

    fn state_topic(&self) -> String;

    fn discovery_config(&self) -> Value;

    fn state_payload(&self) -> String;

    /// Short human readable state, for logs and the status page.
    fn status(&self) -> String;

    async fn handle_command(&self, payload: &[u8]) -> Result<()>;
}

/// Creates the light and one switch per room currently in the cache.
///
/// Rooms whose ids sanitize to an already used topic segment are skipped.
pub fn build_entities(api: &Arc<LedFootApi>, topics: &Topics, settings: &Settings) -> Vec<EntityPointer> {
    let mut entities: Vec<EntityPointer> = vec![];
    if settings.mount_light.unwrap_or_default() {
        entities.push(Arc::new(LedFootLight::new(
            api.clone(),
            topics.clone(),
            settings.effects.clone(),
        )));
    }
    if settings.mount_rooms.unwrap_or_default() {
        let mut segments: HashMap<String, String> = HashMap::new();
        for room_id in api.room_ids() {
            match segments.entry(sanitize(&room_id)) {
                Entry::Occupied(taken) => {
                    warn!(
                        "Room '{room_id}' shares its topic with room '{}', not exposing it",
                        taken.get()
                    );
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(room_id.clone());
                }
            }
            entities.push(Arc::new(LedFootRoom::new(api.clone(), topics.clone(), &room_id)));
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use led_foot_client::test_helper::{MockLedFootServer, MockServerState};
    use led_foot_client::{LedFootClient, LedFootOptions};

    #[test]
    fn test_topics() {
        let topics = Topics::new("homeassistant/", "led_foot");
        assert_eq!(topics.availability(), "led_foot/status");
        assert_eq!(topics.light_command(), "led_foot/light/set");
        assert_eq!(topics.room_state("living room"), "led_foot/room/living_room/state");
        assert_eq!(
            topics.discovery(Component::Switch, "led_foot_office"),
            "homeassistant/switch/led_foot_office/config"
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("living_room"), "living_room");
        assert_eq!(sanitize("a/b+c#d.e"), "a_b_c_d_e");
    }

    #[test]
    fn test_build_without_rooms() {
        let api = Arc::new(LedFootApi::new(
            LedFootClient::new(LedFootOptions::default()).unwrap(),
        ));
        let topics = Topics::new("homeassistant", "led_foot");
        let entities = build_entities(&api, &topics, &Settings::default());
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].component(), Component::Light);

        let settings = Settings {
            mount_light: Some(false),
            ..Default::default()
        };
        assert!(build_entities(&api, &topics, &settings).is_empty());
    }

    #[tokio::test]
    async fn test_colliding_room_ids_get_one_switch() {
        let server = MockLedFootServer::start(MockServerState {
            rooms: [("living room", false), ("living_room", true), ("office", false)]
                .into_iter()
                .collect(),
            ..Default::default()
        })
        .await;
        let options = LedFootOptions::builder()
            .base_url(server.base_url())
            .build()
            .unwrap();
        let api = Arc::new(LedFootApi::new(LedFootClient::new(options).unwrap()));
        api.pull_state().await.unwrap();

        let topics = Topics::new("homeassistant", "led_foot");
        let entities = build_entities(&api, &topics, &Settings::default());
        assert_eq!(entities.len(), 3);

        let mut command_topics: Vec<_> = entities.iter().map(|e| e.command_topic()).collect();
        command_topics.sort();
        command_topics.dedup();
        assert_eq!(command_topics.len(), entities.len());
        // BTreeMap order: "living room" sorts first and keeps the topic
        assert!(
            entities
                .iter()
                .any(|e| e.unique_id() == "switch.led_foot.living room")
        );
        assert!(
            !entities
                .iter()
                .any(|e| e.unique_id() == "switch.led_foot.living_room")
        );
    }
}
