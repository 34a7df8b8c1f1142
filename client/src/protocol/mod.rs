pub mod client;
pub mod color;
pub mod rooms;
pub mod state;
