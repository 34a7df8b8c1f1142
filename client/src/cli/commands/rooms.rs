use led_foot_client::LedFootClientError;

use crate::{Params, utils::pulled_api};

pub async fn list_rooms(params: &Params) -> Result<(), LedFootClientError> {
    let api = pulled_api(params).await?;
    let rooms = api.rooms();
    if rooms.is_empty() {
        println!("The server reports no rooms");
    }
    for (id, on) in rooms.iter() {
        println!("Room '{id}': {}", if on { "on" } else { "off" });
    }
    Ok(())
}

pub async fn switch_room(params: &Params, id: &str, on: bool) -> Result<(), LedFootClientError> {
    let api = pulled_api(params).await?;
    if !api.set_room(id, on) {
        println!("Unknown room '{id}', known rooms: {}", api.room_ids().join(", "));
        return Ok(());
    }
    api.push_rooms().await?;
    println!("Room '{id}' turned {}", if on { "on" } else { "off" });
    Ok(())
}

pub async fn only_room(params: &Params, id: &str) -> Result<(), LedFootClientError> {
    let api = pulled_api(params).await?;
    if !api.set_active_room_only(id) {
        println!("Unknown room '{id}', known rooms: {}", api.room_ids().join(", "));
        return Ok(());
    }
    api.push_rooms().await?;
    println!("Room '{id}' is now the only active room");
    Ok(())
}
