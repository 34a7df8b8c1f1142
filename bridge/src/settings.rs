use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Home Assistant MQTT discovery prefix.
    pub discovery_prefix: String,
    /// Root of the state, command and availability topics.
    pub base_topic: String,
    pub poll_interval_secs: u64,
    pub mount_light: Option<bool>,
    pub mount_rooms: Option<bool>,
    /// Sequence names offered as light effects.
    pub effects: Vec<String>,
    pub web_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            discovery_prefix: String::from("homeassistant"),
            base_topic: String::from("led_foot"),
            poll_interval_secs: 10,
            mount_light: Some(true),
            mount_rooms: Some(true),
            effects: vec![],
            web_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_file() {
        let json = r#"{"base_topic":"hallway","effects":["sunrise","gradient_cools"],"mount_rooms":false}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.base_topic, "hallway");
        assert_eq!(settings.discovery_prefix, "homeassistant");
        assert_eq!(settings.poll_interval_secs, 10);
        assert_eq!(settings.mount_rooms, Some(false));
        assert_eq!(settings.mount_light, Some(true));
        assert_eq!(settings.effects.len(), 2);
    }
}
