use led_foot_client::LedFootClientError;

use crate::{Params, utils::{create_api, pulled_api}};

pub async fn ping(params: &Params) -> Result<(), LedFootClientError> {
    let api = create_api(params)?;
    api.client().ping().await?;
    println!("LED Foot server at {} is up", api.client().base_url());
    Ok(())
}

pub async fn status(params: &Params) -> Result<(), LedFootClientError> {
    let api = pulled_api(params).await?;
    let state = api.snapshot();
    let color = state.current_rgbw;
    println!("Server: {}", api.client().base_url());
    println!(
        "Light: {} color {color} brightness {}",
        if color.is_on() { "on" } else { "off" },
        color.brightness()
    );
    println!("  rgb {} / white {}", color.to_css_rgb(), color.to_css_white());
    println!(
        "Sequence: {}",
        state.current_sequence.as_deref().unwrap_or("none")
    );
    for (id, on) in state.rooms.iter() {
        println!("Room '{id}': {}", if on { "on" } else { "off" });
    }
    Ok(())
}
