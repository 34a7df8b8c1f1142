use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use led_foot_client::LedFootApi;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::entities::{
    Component, DeviceInfo, LedFootEntity, MANUFACTURER, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE,
    PAYLOAD_OFF, PAYLOAD_ON, Topics, sanitize,
};

#[derive(Debug, Serialize)]
struct SwitchDiscovery<'a> {
    name: &'a str,
    unique_id: &'a str,
    object_id: &'a str,
    command_topic: String,
    state_topic: String,
    availability_topic: String,
    payload_available: &'a str,
    payload_not_available: &'a str,
    payload_on: &'a str,
    payload_off: &'a str,
    state_on: &'a str,
    state_off: &'a str,
    device: DeviceInfo,
}

/// Relay of one room, as a switch.
pub(crate) struct LedFootRoom {
    api: Arc<LedFootApi>,
    topics: Topics,
    room_id: String,
    name: String,
    unique_id: String,
}

impl LedFootRoom {
    pub(crate) fn new(api: Arc<LedFootApi>, topics: Topics, room_id: &str) -> Self {
        Self {
            api,
            topics,
            room_id: room_id.to_string(),
            name: format!("Led Foot Room {room_id}"),
            unique_id: format!("switch.led_foot.{room_id}"),
        }
    }

    /// Rooms missing from the cache read as off.
    pub fn is_on(&self) -> bool {
        self.api.rooms().is_on(&self.room_id)
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.switch(true).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.switch(false).await
    }

    async fn switch(&self, on: bool) -> Result<()> {
        if !self.api.set_room(&self.room_id, on) {
            warn!("Room {} is unknown to the server, ignoring", self.room_id);
            return Ok(());
        }
        info!("Turning room {} {}", self.room_id, if on { "on" } else { "off" });
        self.api.push_rooms().await?;
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![self.unique_id.clone()],
            name: self.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: "LED Foot Switch".to_string(),
            sw_version: "0.0.1".to_string(),
        }
    }
}

#[async_trait]
impl LedFootEntity for LedFootRoom {
    fn unique_id(&self) -> String {
        self.unique_id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn component(&self) -> Component {
        Component::Switch
    }

    fn object_id(&self) -> String {
        format!("led_foot_{}", sanitize(&self.room_id))
    }

    fn command_topic(&self) -> String {
        self.topics.room_command(&self.room_id)
    }

    fn state_topic(&self) -> String {
        self.topics.room_state(&self.room_id)
    }

    fn discovery_config(&self) -> Value {
        let object_id = self.object_id();
        let config = SwitchDiscovery {
            name: &self.name,
            unique_id: &self.unique_id,
            object_id: &object_id,
            command_topic: self.command_topic(),
            state_topic: self.state_topic(),
            availability_topic: self.topics.availability(),
            payload_available: PAYLOAD_AVAILABLE,
            payload_not_available: PAYLOAD_NOT_AVAILABLE,
            payload_on: PAYLOAD_ON,
            payload_off: PAYLOAD_OFF,
            state_on: PAYLOAD_ON,
            state_off: PAYLOAD_OFF,
            device: self.device_info(),
        };
        serde_json::to_value(config).unwrap_or(Value::Null)
    }

    fn state_payload(&self) -> String {
        if self.is_on() { PAYLOAD_ON } else { PAYLOAD_OFF }.to_string()
    }

    fn status(&self) -> String {
        if self.is_on() { "on" } else { "off" }.to_string()
    }

    async fn handle_command(&self, payload: &[u8]) -> Result<()> {
        match std::str::from_utf8(payload).map(str::trim) {
            Ok(PAYLOAD_ON) => self.turn_on().await,
            Ok(PAYLOAD_OFF) => self.turn_off().await,
            _ => bail!(
                "Invalid command for room {}: {}",
                self.room_id,
                String::from_utf8_lossy(payload)
            ),
        }
    }
}
