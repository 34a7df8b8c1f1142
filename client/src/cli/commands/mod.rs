mod color;
mod rooms;
mod sequence;
mod status;

pub use color::{get_color, set_color, turn_off, turn_on};
pub use rooms::{list_rooms, only_room, switch_room};
pub use sequence::{get_sequence, set_sequence};
pub use status::{ping, status};
