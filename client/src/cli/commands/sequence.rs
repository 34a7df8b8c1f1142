use led_foot_client::LedFootClientError;

use crate::{Params, utils::create_api};

pub async fn get_sequence(params: &Params) -> Result<(), LedFootClientError> {
    let api = create_api(params)?;
    match api.client().get_sequence().await? {
        Some(sequence) => println!("Running sequence '{sequence}'"),
        None => println!("No sequence running"),
    }
    Ok(())
}

pub async fn set_sequence(params: &Params, name: &str) -> Result<(), LedFootClientError> {
    let api = create_api(params)?;
    api.client().set_sequence(name).await?;
    println!("Sequence '{name}' started");
    Ok(())
}
