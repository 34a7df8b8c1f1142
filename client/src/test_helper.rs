//! In-process fake of the LED Foot server API, for tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::protocol::client::SequenceMessage;
use crate::protocol::color::WireColor;
use crate::protocol::rooms::Rooms;

/// What the fake server holds, plus counters of the writes it received.
#[derive(Debug, Clone, Default)]
pub struct MockServerState {
    pub color: WireColor,
    pub sequence: Option<String>,
    pub rooms: Rooms,
    /// Every endpoint answers 500 while set.
    pub failing: bool,
    pub color_posts: usize,
    pub sequence_posts: usize,
    pub room_posts: usize,
}

type Shared = Arc<Mutex<MockServerState>>;

pub struct MockLedFootServer {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockLedFootServer {
    pub async fn start(initial: MockServerState) -> Self {
        let state = Arc::new(Mutex::new(initial));
        let app = Router::new()
            .route("/api/", get(root))
            .route("/api/get-color", get(get_color))
            .route("/api/set-color", post(set_color))
            .route("/api/get-sequence", get(get_sequence))
            .route("/api/set-sequence", post(set_sequence))
            .route("/api/get-rooms", get(get_rooms))
            .route("/api/set-rooms", post(set_rooms))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn state(&self) -> MockServerState {
        self.state.lock().clone()
    }

    /// Changes what the server reports, as if another client had written to it.
    pub fn update(&self, f: impl FnOnce(&mut MockServerState)) {
        f(&mut self.state.lock());
    }
}

impl Drop for MockLedFootServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn check(state: &MockServerState) -> Result<(), StatusCode> {
    if state.failing {
        Err(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        Ok(())
    }
}

async fn root(State(state): State<Shared>) -> Result<&'static str, StatusCode> {
    check(&state.lock())?;
    Ok("LED Foot")
}

async fn get_color(State(state): State<Shared>) -> Result<Json<WireColor>, StatusCode> {
    let state = state.lock();
    check(&state)?;
    Ok(Json(state.color))
}

async fn set_color(State(state): State<Shared>, Json(color): Json<WireColor>) -> StatusCode {
    let mut state = state.lock();
    if state.failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.color = color;
    state.color_posts += 1;
    StatusCode::OK
}

async fn get_sequence(State(state): State<Shared>) -> Result<Json<SequenceMessage>, StatusCode> {
    let state = state.lock();
    check(&state)?;
    Ok(Json(SequenceMessage {
        sequence: state.sequence.clone(),
    }))
}

async fn set_sequence(
    State(state): State<Shared>,
    Json(message): Json<SequenceMessage>,
) -> StatusCode {
    let mut state = state.lock();
    if state.failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.sequence = message.sequence;
    state.sequence_posts += 1;
    StatusCode::OK
}

async fn get_rooms(State(state): State<Shared>) -> Result<Json<Rooms>, StatusCode> {
    let state = state.lock();
    check(&state)?;
    Ok(Json(state.rooms.clone()))
}

async fn set_rooms(State(state): State<Shared>, Json(rooms): Json<Rooms>) -> StatusCode {
    let mut state = state.lock();
    if state.failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.rooms = rooms;
    state.room_posts += 1;
    StatusCode::OK
}
