use led_foot_client::{DEFAULT_OFF_COLOR, DEFAULT_ON_COLOR, LedFootClientError, Rgbw};

use crate::{Params, utils::create_api};

pub async fn get_color(params: &Params) -> Result<(), LedFootClientError> {
    let api = create_api(params)?;
    let color = api.client().get_rgbw().await?;
    println!(
        "Color {color} brightness {} ({})",
        color.brightness(),
        if color.is_on() { "on" } else { "off" }
    );
    Ok(())
}

pub async fn set_color(params: &Params, color: Rgbw) -> Result<(), LedFootClientError> {
    let api = create_api(params)?;
    api.push_solid_color(color).await?;
    println!("Color set to {color}");
    Ok(())
}

pub async fn turn_on(params: &Params) -> Result<(), LedFootClientError> {
    set_color(params, DEFAULT_ON_COLOR).await
}

pub async fn turn_off(params: &Params) -> Result<(), LedFootClientError> {
    set_color(params, DEFAULT_OFF_COLOR).await
}
