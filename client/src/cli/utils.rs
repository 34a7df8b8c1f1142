use led_foot_client::{LedFootApi, LedFootClient, LedFootClientError, LedFootOptions};

use crate::Params;

pub fn create_api(params: &Params) -> Result<LedFootApi, LedFootClientError> {
    let options = LedFootOptions::builder()
        .base_url(params.server.clone())
        .build()
        .map_err(|e| LedFootClientError::Generic(e.to_string()))?;
    Ok(LedFootApi::new(LedFootClient::new(options)?))
}

/// Like [`create_api`], with the cache already pulled from the server.
pub async fn pulled_api(params: &Params) -> Result<LedFootApi, LedFootClientError> {
    let api = create_api(params)?;
    api.pull_state().await?;
    Ok(api)
}
