use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use led_foot_client::{
    DEFAULT_OFF_COLOR, DEFAULT_ON_COLOR, LedFootApi, LedFootClientError, Rgbw,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::entities::{
    Component, DeviceInfo, LedFootEntity, MANUFACTURER, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE,
    Topics,
};

const NAME: &str = "Led Foot";
const UNIQUE_ID: &str = "light.led_foot";
const OBJECT_ID: &str = "led_foot";
const COLOR_MODE_RGBW: &str = "rgbw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum PowerState {
    On,
    Off,
}

/// Command sent by Home Assistant with the JSON light schema.
#[derive(Debug, Clone, Deserialize)]
struct LightCommand {
    state: PowerState,
    brightness: Option<u8>,
    color: Option<Rgbw>,
    effect: Option<String>,
}

#[derive(Debug, Serialize)]
struct LightStatePayload<'a> {
    state: PowerState,
    color_mode: &'a str,
    brightness: u8,
    color: Rgbw,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<String>,
}

#[derive(Debug, Serialize)]
struct LightDiscovery<'a> {
    name: &'a str,
    unique_id: &'a str,
    object_id: &'a str,
    schema: &'a str,
    command_topic: String,
    state_topic: String,
    availability_topic: String,
    payload_available: &'a str,
    payload_not_available: &'a str,
    brightness: bool,
    supported_color_modes: [&'a str; 1],
    effect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect_list: Option<&'a [String]>,
    device: DeviceInfo,
}

/// The LED strip, as an RGBW light whose effects are server sequences.
pub(crate) struct LedFootLight {
    api: Arc<LedFootApi>,
    topics: Topics,
    effects: Vec<String>,
}

impl LedFootLight {
    pub(crate) fn new(api: Arc<LedFootApi>, topics: Topics, effects: Vec<String>) -> Self {
        Self {
            api,
            topics,
            effects,
        }
    }

    pub fn is_on(&self) -> bool {
        self.api.rgbw().is_on()
    }

    pub fn brightness(&self) -> u8 {
        self.api.rgbw().brightness()
    }

    pub fn rgbw_color(&self) -> Rgbw {
        self.api.rgbw()
    }

    /// A color wins over a brightness; a bare brightness lights every channel
    /// equally; with neither the default on color is used.
    fn resolve_color(rgbw: Option<Rgbw>, brightness: Option<u8>) -> Rgbw {
        match (rgbw, brightness) {
            (Some(color), _) => color,
            (None, Some(brightness)) => Rgbw::uniform(brightness),
            (None, None) => DEFAULT_ON_COLOR,
        }
    }

    pub async fn turn_on(
        &self,
        rgbw: Option<Rgbw>,
        brightness: Option<u8>,
    ) -> Result<(), LedFootClientError> {
        let color = Self::resolve_color(rgbw, brightness);
        info!("Turning {NAME} on with {color}");
        self.api.push_solid_color(color).await
    }

    pub async fn turn_off(&self) -> Result<(), LedFootClientError> {
        info!("Turning {NAME} off");
        self.api.push_solid_color(DEFAULT_OFF_COLOR).await
    }

    /// Starts a server sequence, leaving the cached color as is.
    pub async fn start_effect(&self, effect: &str) -> Result<(), LedFootClientError> {
        info!("Starting sequence {effect} on {NAME}");
        self.api.set_sequence(Some(effect.to_string()));
        self.api.push().await
    }

    /// Sets the color and starts the sequence in a single push.
    pub async fn turn_on_with_effect(
        &self,
        rgbw: Option<Rgbw>,
        brightness: Option<u8>,
        effect: &str,
    ) -> Result<(), LedFootClientError> {
        let color = Self::resolve_color(rgbw, brightness);
        info!("Turning {NAME} on with {color} and sequence {effect}");
        self.api.set_rgbw(color);
        self.api.set_sequence(Some(effect.to_string()));
        self.api.push().await
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![UNIQUE_ID.to_string()],
            name: NAME.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            model: "LED Foot".to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[async_trait]
impl LedFootEntity for LedFootLight {
    fn unique_id(&self) -> String {
        UNIQUE_ID.to_string()
    }

    fn name(&self) -> String {
        NAME.to_string()
    }

    fn component(&self) -> Component {
        Component::Light
    }

    fn object_id(&self) -> String {
        OBJECT_ID.to_string()
    }

    fn command_topic(&self) -> String {
        self.topics.light_command()
    }

    fn state_topic(&self) -> String {
        self.topics.light_state()
    }

    fn discovery_config(&self) -> Value {
        let config = LightDiscovery {
            name: NAME,
            unique_id: UNIQUE_ID,
            object_id: OBJECT_ID,
            schema: "json",
            command_topic: self.command_topic(),
            state_topic: self.state_topic(),
            availability_topic: self.topics.availability(),
            payload_available: PAYLOAD_AVAILABLE,
            payload_not_available: PAYLOAD_NOT_AVAILABLE,
            brightness: true,
            supported_color_modes: [COLOR_MODE_RGBW],
            effect: !self.effects.is_empty(),
            effect_list: (!self.effects.is_empty()).then_some(self.effects.as_slice()),
            device: self.device_info(),
        };
        serde_json::to_value(config).unwrap_or(Value::Null)
    }

    fn state_payload(&self) -> String {
        let state = self.api.snapshot();
        let color = state.current_rgbw;
        let payload = LightStatePayload {
            state: if color.is_on() {
                PowerState::On
            } else {
                PowerState::Off
            },
            color_mode: COLOR_MODE_RGBW,
            brightness: color.brightness(),
            color,
            effect: state.current_sequence,
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }

    fn status(&self) -> String {
        if self.is_on() {
            format!("on {} brightness {}", self.rgbw_color(), self.brightness())
        } else {
            "off".to_string()
        }
    }

    async fn handle_command(&self, payload: &[u8]) -> Result<()> {
        let command: LightCommand =
            serde_json::from_slice(payload).context("Invalid light command")?;
        debug!(?command, "Light command");
        match command.state {
            PowerState::Off => self.turn_off().await?,
            PowerState::On => match (&command.effect, command.color, command.brightness) {
                (Some(effect), None, None) => self.start_effect(effect).await?,
                (Some(effect), color, brightness) => {
                    self.turn_on_with_effect(color, brightness, effect).await?
                }
                (None, color, brightness) => self.turn_on(color, brightness).await?,
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use led_foot_client::test_helper::{MockLedFootServer, MockServerState};
    use led_foot_client::{LedFootClient, LedFootOptions, WireColor};

    async fn light_with_server(initial: MockServerState) -> (MockLedFootServer, LedFootLight) {
        let server = MockLedFootServer::start(initial).await;
        let options = LedFootOptions::builder()
            .base_url(server.base_url())
            .build()
            .unwrap();
        let api = Arc::new(LedFootApi::new(LedFootClient::new(options).unwrap()));
        api.pull_state().await.unwrap();
        let light = LedFootLight::new(
            api,
            Topics::new("homeassistant", "led_foot"),
            vec!["sunrise".to_string()],
        );
        (server, light)
    }

    #[tokio::test]
    async fn test_turn_on_without_arguments() {
        let (server, light) = light_with_server(MockServerState::default()).await;
        assert!(!light.is_on());

        light.turn_on(None, None).await.unwrap();
        assert_eq!(light.rgbw_color(), DEFAULT_ON_COLOR);
        assert_eq!(server.state().color, WireColor::from(DEFAULT_ON_COLOR));
        assert!(light.is_on());
    }

    #[tokio::test]
    async fn test_turn_on_with_brightness_only() {
        let (_server, light) = light_with_server(MockServerState::default()).await;
        light.turn_on(None, Some(100)).await.unwrap();
        assert_eq!(light.rgbw_color(), Rgbw::uniform(100));
    }

    #[tokio::test]
    async fn test_color_wins_over_brightness() {
        let (_server, light) = light_with_server(MockServerState::default()).await;
        light
            .turn_on(Some(Rgbw::new(10, 20, 30, 40)), Some(200))
            .await
            .unwrap();
        assert_eq!(light.rgbw_color(), Rgbw::new(10, 20, 30, 40));
    }

    #[tokio::test]
    async fn test_turn_off() {
        let (server, light) = light_with_server(MockServerState {
            color: WireColor {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                w: 1.0,
            },
            ..Default::default()
        })
        .await;
        assert!(light.is_on());
        assert_eq!(light.brightness(), 255);

        light.handle_command(br#"{"state":"OFF"}"#).await.unwrap();
        assert!(!light.is_on());
        assert_eq!(server.state().color, WireColor::default());
        assert_eq!(light.status(), "off");
    }

    #[tokio::test]
    async fn test_command_payloads() {
        let (server, light) = light_with_server(MockServerState::default()).await;

        light
            .handle_command(br#"{"state":"ON","color":{"r":255,"g":0,"b":0,"w":0}}"#)
            .await
            .unwrap();
        assert_eq!(light.rgbw_color(), Rgbw::new(255, 0, 0, 0));

        light
            .handle_command(br#"{"state":"ON","effect":"sunrise"}"#)
            .await
            .unwrap();
        assert_eq!(server.state().sequence.as_deref(), Some("sunrise"));
        assert_eq!(light.rgbw_color(), Rgbw::new(255, 0, 0, 0));

        assert!(light.handle_command(b"not json").await.is_err());
    }

    #[tokio::test]
    async fn test_solid_color_replaces_effect() {
        let (server, light) = light_with_server(MockServerState::default()).await;
        light
            .handle_command(br#"{"state":"ON","effect":"sunrise"}"#)
            .await
            .unwrap();
        assert_eq!(light.api.sequence().as_deref(), Some("sunrise"));

        light
            .handle_command(br#"{"state":"ON","color":{"r":0,"g":0,"b":255,"w":0}}"#)
            .await
            .unwrap();
        assert_eq!(light.api.sequence(), None);
        assert_eq!(light.rgbw_color(), Rgbw::new(0, 0, 255, 0));
        assert_eq!(server.state().sequence_posts, 1);
        let payload: Value = serde_json::from_str(&light.state_payload()).unwrap();
        assert!(payload.get("effect").is_none());
    }

    #[tokio::test]
    async fn test_effect_with_brightness_keeps_both() {
        let (server, light) = light_with_server(MockServerState::default()).await;
        light
            .handle_command(br#"{"state":"ON","effect":"sunrise","brightness":40}"#)
            .await
            .unwrap();
        assert_eq!(light.rgbw_color(), Rgbw::uniform(40));
        assert_eq!(light.api.sequence().as_deref(), Some("sunrise"));
        let state = server.state();
        assert_eq!(state.sequence.as_deref(), Some("sunrise"));
        assert_eq!(state.color, WireColor::from(Rgbw::uniform(40)));
    }

    #[tokio::test]
    async fn test_state_payload() {
        let (_server, light) = light_with_server(MockServerState {
            color: WireColor {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                w: 1.0,
            },
            sequence: Some("sunrise".to_string()),
            ..Default::default()
        })
        .await;
        let payload: Value = serde_json::from_str(&light.state_payload()).unwrap();
        assert_eq!(payload["state"], "ON");
        assert_eq!(payload["color_mode"], "rgbw");
        assert_eq!(payload["brightness"], 128);
        assert_eq!(payload["color"]["w"], 255);
        assert_eq!(payload["effect"], "sunrise");
    }

    #[tokio::test]
    async fn test_discovery_config() {
        let (_server, light) = light_with_server(MockServerState::default()).await;
        let config = light.discovery_config();
        assert_eq!(config["unique_id"], "light.led_foot");
        assert_eq!(config["schema"], "json");
        assert_eq!(config["command_topic"], "led_foot/light/set");
        assert_eq!(config["availability_topic"], "led_foot/status");
        assert_eq!(config["supported_color_modes"][0], "rgbw");
        assert_eq!(config["effect_list"][0], "sunrise");
        assert_eq!(config["device"]["manufacturer"], "Kind Digits");
    }
}
