mod bridge;
mod entities;
mod logging;
mod settings;
mod web;

use std::time::Duration;

use anyhow::{Context, Result};
use bridge::{BridgeOptions, start_bridge};
use clap::Parser;
use led_foot_client::DEFAULT_SERVER_API;
use logging::{LogConfig, RotationPeriod, setup_logging};
use settings::Settings;
use tracing::{info, warn};
use web::state::BridgeState;
use web::{WebConfig, start_web_server};

#[derive(Parser, Debug)]
#[command(about = "Expose a LED Foot lighting server to Home Assistant over MQTT")]
pub struct Params {
    /// Base URL of the LED Foot server API
    #[clap(long, env = "LED_FOOT_SERVER", default_value = DEFAULT_SERVER_API)]
    server: String,
    /// Hostname of the MQTT broker
    #[clap(long, env = "MQTT_HOST", default_value = "localhost")]
    mqtt_host: String,
    #[clap(long, env = "MQTT_PORT", default_value_t = 1883)]
    mqtt_port: u16,
    #[clap(long, env = "MQTT_USER")]
    mqtt_user: Option<String>,
    #[clap(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    mqtt_password: Option<String>,
    /// JSON settings file (defaults are used when missing)
    #[clap(long)]
    settings: Option<String>,
    /// Port of the status and metrics server
    #[clap(long, default_value_t = 8080)]
    web_port: u16,
    /// Directory for rolling log files (console only when not set)
    #[clap(long)]
    log_dir: Option<String>,
    /// Log rotation: minutely, hourly, daily or never
    #[clap(long, default_value = "daily")]
    log_rotation: RotationPeriod,
    /// Rotated log files to keep, 0 keeps all
    #[clap(long, default_value_t = 7)]
    max_log_files: usize,
}

fn load_settings(path: Option<&str>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {path}")),
        Err(e) => {
            warn!("Failed to read settings file {path} ({e}), using default settings");
            Ok(Settings::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let params = Params::parse();

    let log_config = params
        .log_dir
        .as_ref()
        .map(|dir| LogConfig::new(dir, params.log_rotation, params.max_log_files));
    let _log_guard = setup_logging(log_config).context("Failed to set up logging")?;

    let settings = load_settings(params.settings.as_deref())?;
    info!("Starting LED Foot bridge {}", env!("CARGO_PKG_VERSION"));

    let bridge_state = BridgeState::new(
        &params.server,
        Duration::from_secs(settings.poll_interval_secs),
    );
    start_web_server(
        WebConfig {
            port: params.web_port,
            enabled: settings.web_enabled,
        },
        bridge_state.clone(),
    )
    .await
    .context("Failed to start the web server")?;

    start_bridge(
        BridgeOptions {
            server: params.server,
            mqtt_host: params.mqtt_host,
            mqtt_port: params.mqtt_port,
            mqtt_user: params.mqtt_user,
            mqtt_password: params.mqtt_password,
        },
        settings,
        bridge_state,
    )
    .await
}
