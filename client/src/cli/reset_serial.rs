use std::time::Duration;

use clap::Parser;
use led_foot_client::serial::{DEFAULT_SERIAL_PORT, SerialResetError, reset_serial};
use tracing_subscriber::EnvFilter;

/// Flushes a stuck serial link to the LED microcontroller.
#[derive(Parser, Debug)]
struct Params {
    #[clap(long, default_value = DEFAULT_SERIAL_PORT)]
    port: String,
    /// Read timeout for the reply byte
    #[clap(long, default_value = "2000")]
    timeout_ms: u64,
}

fn main() -> Result<(), SerialResetError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let params = Params::parse();
    let reply = reset_serial(&params.port, Duration::from_millis(params.timeout_ms))?;
    println!("Serial link on {} answered {:#04x}", params.port, reply);
    Ok(())
}
