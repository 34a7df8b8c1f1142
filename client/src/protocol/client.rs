use std::time::Duration;

use derive_builder::Builder;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::color::{DEFAULT_COLOR, Rgbw, WireColor};
use crate::protocol::rooms::Rooms;

pub const DEFAULT_SERVER_API: &str = "http://localhost:5000/api/";

const GET_COLOR: &str = "get-color";
const SET_COLOR: &str = "set-color";
const GET_SEQUENCE: &str = "get-sequence";
const SET_SEQUENCE: &str = "set-sequence";
const GET_ROOMS: &str = "get-rooms";
const SET_ROOMS: &str = "set-rooms";

#[derive(Error, Debug)]
pub enum LedFootClientError {
    #[error("Invalid server url: {0}")]
    InvalidUrl(String),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server answered {status} on {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("Client error: {0}")]
    Generic(String),
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct LedFootOptions {
    /// Base URL of the server API, `http://localhost:5000/api/` by default.
    #[builder(default = "DEFAULT_SERVER_API.to_string()")]
    pub base_url: String,
    #[builder(default = "Duration::from_secs(5)")]
    pub timeout: Duration,
}

impl LedFootOptions {
    pub fn builder() -> LedFootOptionsBuilder {
        LedFootOptionsBuilder::default()
    }
}

impl Default for LedFootOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_API.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Body of the sequence endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMessage {
    pub sequence: Option<String>,
}

/// Thin wrapper around the LED Foot HTTP API. Holds no state besides the connection pool.
#[derive(Debug, Clone)]
pub struct LedFootClient {
    http: reqwest::Client,
    base_url: Url,
}

fn parse_base_url(base_url: &str) -> Result<Url, LedFootClientError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|e| LedFootClientError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(LedFootClientError::InvalidUrl(base_url.to_string()));
    }
    Ok(url)
}

impl LedFootClient {
    pub fn new(options: LedFootOptions) -> Result<Self, LedFootClientError> {
        let base_url = parse_base_url(&options.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedFootClientError> {
        self.base_url
            .join(path)
            .map_err(|e| LedFootClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// GETs `path`, returning `None` when the server answers with a non-success status.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LedFootClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Server answered {status} on {path}");
            return Ok(None);
        }
        Ok(Some(response.json::<T>().await?))
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), LedFootClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        // `json` sets `Content-Type: application/json`
        let response = self.http.post(url).json(body).send().await?;
        check_status(path, response.status())
    }

    /// Checks that the server API answers.
    pub async fn ping(&self) -> Result<(), LedFootClientError> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        check_status("/", response.status())
    }

    pub async fn get_rgbw(&self) -> Result<Rgbw, LedFootClientError> {
        Ok(self
            .get_json::<WireColor>(GET_COLOR)
            .await?
            .map(Rgbw::from)
            .unwrap_or(DEFAULT_COLOR))
    }

    pub async fn set_rgbw(&self, color: Rgbw) -> Result<(), LedFootClientError> {
        self.post_json(SET_COLOR, &WireColor::from(color)).await
    }

    pub async fn get_sequence(&self) -> Result<Option<String>, LedFootClientError> {
        Ok(self
            .get_json::<SequenceMessage>(GET_SEQUENCE)
            .await?
            .and_then(|message| message.sequence))
    }

    pub async fn set_sequence(&self, name: &str) -> Result<(), LedFootClientError> {
        let message = SequenceMessage {
            sequence: Some(name.to_string()),
        };
        self.post_json(SET_SEQUENCE, &message).await
    }

    pub async fn get_rooms(&self) -> Result<Rooms, LedFootClientError> {
        Ok(self.get_json::<Rooms>(GET_ROOMS).await?.unwrap_or_default())
    }

    pub async fn set_rooms(&self, rooms: &Rooms) -> Result<(), LedFootClientError> {
        self.post_json(SET_ROOMS, rooms).await
    }
}

fn check_status(endpoint: &str, status: StatusCode) -> Result<(), LedFootClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(LedFootClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::{MockLedFootServer, MockServerState};

    fn client_for(server: &MockLedFootServer) -> LedFootClient {
        let options = LedFootOptions::builder()
            .base_url(server.base_url())
            .build()
            .unwrap();
        LedFootClient::new(options).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(url.join(GET_COLOR).unwrap().as_str(), "http://localhost:5000/api/get-color");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(LedFootClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_default_options() {
        let options = LedFootOptions::builder().build().unwrap();
        assert_eq!(options.base_url, DEFAULT_SERVER_API);
        assert_eq!(options.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_get_and_set_color() {
        let server = MockLedFootServer::start(MockServerState {
            color: WireColor {
                r: 1.0,
                g: 0.0,
                b: 0.5,
                w: 0.0,
            },
            ..Default::default()
        })
        .await;
        let client = client_for(&server);

        assert_eq!(client.get_rgbw().await.unwrap(), Rgbw::new(255, 0, 128, 0));

        client.set_rgbw(Rgbw::new(0, 0, 0, 255)).await.unwrap();
        let state = server.state();
        assert_eq!(state.color_posts, 1);
        assert_eq!(state.color, WireColor { r: 0.0, g: 0.0, b: 0.0, w: 1.0 });
    }

    #[tokio::test]
    async fn test_failing_server() {
        let server = MockLedFootServer::start(MockServerState {
            failing: true,
            ..Default::default()
        })
        .await;
        let client = client_for(&server);

        assert_eq!(client.get_rgbw().await.unwrap(), DEFAULT_COLOR);
        assert_eq!(client.get_sequence().await.unwrap(), None);
        assert!(client.get_rooms().await.unwrap().is_empty());
        assert!(matches!(
            client.set_rgbw(Rgbw::uniform(10)).await,
            Err(LedFootClientError::Status { status: 500, .. })
        ));
        assert!(client.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_sequence_and_rooms() {
        let server = MockLedFootServer::start(MockServerState {
            sequence: Some("sunrise".to_string()),
            rooms: [("office", false), ("bedroom", true)].into_iter().collect(),
            ..Default::default()
        })
        .await;
        let client = client_for(&server);

        client.ping().await.unwrap();
        assert_eq!(client.get_sequence().await.unwrap().as_deref(), Some("sunrise"));

        client.set_sequence("gradient_cools").await.unwrap();
        assert_eq!(server.state().sequence.as_deref(), Some("gradient_cools"));

        let mut rooms = client.get_rooms().await.unwrap();
        assert!(rooms.is_on("bedroom"));
        assert!(rooms.set("office", true));
        client.set_rooms(&rooms).await.unwrap();
        assert!(server.state().rooms.is_on("office"));
        assert_eq!(server.state().room_posts, 1);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let options = LedFootOptions::builder()
            .base_url("http://127.0.0.1:1/api/")
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let client = LedFootClient::new(options).unwrap();
        assert!(matches!(
            client.get_rgbw().await,
            Err(LedFootClientError::Request(_))
        ));
    }
}
