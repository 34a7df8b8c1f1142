mod protocol;
pub mod serial;

#[cfg(any(test, feature = "test-util"))]
pub mod test_helper;

pub use protocol::client::*;
pub use protocol::color::*;
pub use protocol::rooms::Rooms;
pub use protocol::state::{LedFootApi, LedFootState};
