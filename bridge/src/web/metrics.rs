//! Prometheus metrics served on `/metrics`.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Installs the global recorder. Fails if one is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_gauge!("led_foot_bridge_info", "Bridge version, always 1");
    describe_gauge!("led_foot_bridge_uptime_seconds", "Seconds since the bridge started");
    describe_gauge!(
        "led_foot_server_reachable",
        "Whether the last poll of the LED Foot server succeeded"
    );
    describe_gauge!("led_foot_mqtt_connected", "MQTT broker connection status");
    describe_gauge!("led_foot_entities_total", "Published entities by component");
    describe_counter!("led_foot_polls_total", "Polls of the LED Foot server");
    describe_counter!("led_foot_poll_failures_total", "Failed polls of the LED Foot server");
    describe_counter!("led_foot_commands_total", "Commands received from MQTT by component");
    describe_counter!("led_foot_command_failures_total", "Commands that could not be applied");
    describe_counter!("led_foot_mqtt_reconnects_total", "MQTT connection acknowledgements");

    Ok(handle)
}

pub struct Metrics;

impl Metrics {
    pub fn set_bridge_info(version: &str) {
        gauge!("led_foot_bridge_info", "version" => version.to_string()).set(1.0);
    }

    pub fn set_uptime(start_time: Instant) {
        gauge!("led_foot_bridge_uptime_seconds").set(start_time.elapsed().as_secs_f64());
    }

    pub fn set_entity_count(component: &str, count: usize) {
        gauge!("led_foot_entities_total", "component" => component.to_string()).set(count as f64);
    }

    pub fn set_mqtt_connected(connected: bool) {
        gauge!("led_foot_mqtt_connected").set(if connected { 1.0 } else { 0.0 });
    }

    pub fn inc_mqtt_reconnects() {
        counter!("led_foot_mqtt_reconnects_total").increment(1);
    }

    pub fn record_poll(success: bool) {
        counter!("led_foot_polls_total").increment(1);
        if !success {
            counter!("led_foot_poll_failures_total").increment(1);
        }
        gauge!("led_foot_server_reachable").set(if success { 1.0 } else { 0.0 });
    }

    pub fn record_command(component: &str, success: bool) {
        counter!("led_foot_commands_total", "component" => component.to_string()).increment(1);
        if !success {
            counter!("led_foot_command_failures_total", "component" => component.to_string())
                .increment(1);
        }
    }
}
