use parking_lot::RwLock;
use tracing::{debug, info};

use crate::protocol::client::{LedFootClient, LedFootClientError};
use crate::protocol::color::{DEFAULT_COLOR, Rgbw};
use crate::protocol::rooms::Rooms;

/// Last known state of the LED Foot server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedFootState {
    pub current_rgbw: Rgbw,
    pub current_sequence: Option<String>,
    pub rooms: Rooms,
}

impl Default for LedFootState {
    fn default() -> Self {
        Self {
            current_rgbw: DEFAULT_COLOR,
            current_sequence: None,
            rooms: Rooms::default(),
        }
    }
}

/// Cached mirror of the server, shared by every entity built on top of it.
///
/// Mutators only touch the cache; `push` and `push_rooms` send it to the
/// server and `pull_state` refreshes it. The cache lock is never held while a
/// request is in flight.
#[derive(Debug)]
pub struct LedFootApi {
    client: LedFootClient,
    state: RwLock<LedFootState>,
}

impl LedFootApi {
    pub fn new(client: LedFootClient) -> Self {
        Self {
            client,
            state: RwLock::new(LedFootState::default()),
        }
    }

    pub fn client(&self) -> &LedFootClient {
        &self.client
    }

    pub fn snapshot(&self) -> LedFootState {
        self.state.read().clone()
    }

    pub fn rgbw(&self) -> Rgbw {
        self.state.read().current_rgbw
    }

    pub fn sequence(&self) -> Option<String> {
        self.state.read().current_sequence.clone()
    }

    pub fn rooms(&self) -> Rooms {
        self.state.read().rooms.clone()
    }

    pub fn room_ids(&self) -> Vec<String> {
        self.state.read().rooms.ids().map(String::from).collect()
    }

    pub fn set_rgbw(&self, color: Rgbw) {
        self.state.write().current_rgbw = color;
    }

    pub fn set_sequence(&self, sequence: Option<String>) {
        self.state.write().current_sequence = sequence;
    }

    /// Updates a cached room. Unknown rooms are left alone and `false` is returned.
    pub fn set_room(&self, id: &str, on: bool) -> bool {
        self.state.write().rooms.set(id, on)
    }

    pub fn set_active_room_only(&self, id: &str) -> bool {
        self.state.write().rooms.set_active_only(id)
    }

    /// Refreshes the whole cache from the server. The cache is untouched on error.
    pub async fn pull_state(&self) -> Result<(), LedFootClientError> {
        let (rgbw, sequence, rooms) = tokio::try_join!(
            self.client.get_rgbw(),
            self.client.get_sequence(),
            self.client.get_rooms(),
        )?;
        debug!(%rgbw, ?sequence, ?rooms, "Pulled state");
        let mut state = self.state.write();
        if state.rooms.len() != rooms.len() {
            info!("Server reports {} rooms", rooms.len());
        }
        *state = LedFootState {
            current_rgbw: rgbw,
            current_sequence: sequence,
            rooms,
        };
        Ok(())
    }

    /// Sends the cached color, and the cached sequence when there is one.
    pub async fn push(&self) -> Result<(), LedFootClientError> {
        let LedFootState {
            current_rgbw,
            current_sequence,
            ..
        } = self.snapshot();
        self.client.set_rgbw(current_rgbw).await?;
        if let Some(sequence) = current_sequence {
            self.client.set_sequence(&sequence).await?;
        }
        Ok(())
    }

    /// Replaces any running sequence with a solid color and pushes it.
    pub async fn push_solid_color(&self, color: Rgbw) -> Result<(), LedFootClientError> {
        {
            let mut state = self.state.write();
            state.current_sequence = None;
            state.current_rgbw = color;
        }
        self.push().await
    }

    pub async fn push_rooms(&self) -> Result<(), LedFootClientError> {
        let rooms = self.rooms();
        self.client.set_rooms(&rooms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::client::LedFootOptions;
    use crate::protocol::color::WireColor;
    use crate::test_helper::{MockLedFootServer, MockServerState};

    fn api_for(server: &MockLedFootServer) -> LedFootApi {
        let options = LedFootOptions::builder()
            .base_url(server.base_url())
            .build()
            .unwrap();
        LedFootApi::new(LedFootClient::new(options).unwrap())
    }

    #[test]
    fn test_initial_state() {
        let state = LedFootState::default();
        assert_eq!(state.current_rgbw, DEFAULT_COLOR);
        assert_eq!(state.current_sequence, None);
        assert!(state.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_pull_state() {
        let server = MockLedFootServer::start(MockServerState {
            color: WireColor {
                r: 0.0,
                g: 0.0,
                b: 1.0,
                w: 0.2,
            },
            sequence: Some("rainbow".to_string()),
            rooms: [("office", true), ("bedroom", false)].into_iter().collect(),
            ..Default::default()
        })
        .await;
        let api = api_for(&server);

        api.pull_state().await.unwrap();
        assert_eq!(api.rgbw(), Rgbw::new(0, 0, 255, 51));
        assert_eq!(api.sequence().as_deref(), Some("rainbow"));
        assert_eq!(api.room_ids(), ["bedroom", "office"]);
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_cache() {
        let options = LedFootOptions::builder()
            .base_url("http://127.0.0.1:1/api/")
            .timeout(std::time::Duration::from_millis(500))
            .build()
            .unwrap();
        let api = LedFootApi::new(LedFootClient::new(options).unwrap());
        api.set_rgbw(Rgbw::uniform(7));

        assert!(api.pull_state().await.is_err());
        assert_eq!(api.rgbw(), Rgbw::uniform(7));
    }

    #[tokio::test]
    async fn test_push_skips_missing_sequence() {
        let server = MockLedFootServer::start(MockServerState::default()).await;
        let api = api_for(&server);

        api.set_rgbw(Rgbw::new(255, 0, 0, 0));
        api.push().await.unwrap();
        let state = server.state();
        assert_eq!(state.color_posts, 1);
        assert_eq!(state.sequence_posts, 0);
        assert_eq!(state.color.r, 1.0);

        api.set_sequence(Some("sunset".to_string()));
        api.push().await.unwrap();
        let state = server.state();
        assert_eq!(state.color_posts, 2);
        assert_eq!(state.sequence.as_deref(), Some("sunset"));
    }

    #[tokio::test]
    async fn test_solid_color_drops_sequence() {
        let server = MockLedFootServer::start(MockServerState {
            sequence: Some("rainbow".to_string()),
            ..Default::default()
        })
        .await;
        let api = api_for(&server);
        api.pull_state().await.unwrap();
        assert_eq!(api.sequence().as_deref(), Some("rainbow"));

        api.push_solid_color(Rgbw::new(0, 255, 0, 0)).await.unwrap();
        assert_eq!(api.sequence(), None);
        assert_eq!(api.rgbw(), Rgbw::new(0, 255, 0, 0));
        let state = server.state();
        assert_eq!(state.color_posts, 1);
        assert_eq!(state.sequence_posts, 0);
        assert_eq!(state.color.g, 1.0);
    }

    #[tokio::test]
    async fn test_push_rooms() {
        let server = MockLedFootServer::start(MockServerState {
            rooms: [("living_room", false), ("office", false)].into_iter().collect(),
            ..Default::default()
        })
        .await;
        let api = api_for(&server);
        api.pull_state().await.unwrap();

        assert!(!api.set_room("garage", true));
        assert!(api.set_room("office", true));
        api.push_rooms().await.unwrap();
        assert!(server.state().rooms.is_on("office"));

        assert!(api.set_active_room_only("living_room"));
        api.push_rooms().await.unwrap();
        let rooms = server.state().rooms;
        assert!(rooms.is_on("living_room"));
        assert!(!rooms.is_on("office"));
    }
}
