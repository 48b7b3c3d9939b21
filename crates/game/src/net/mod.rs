pub mod protocol;
pub mod transport;

pub use protocol::{ClientMessage, DrawnSegment, LevelData, PlayerState, ServerMessage, UpdateData};
pub use transport::{
    DEFAULT_SERVER_ADDR, Transport, TransportEvent, TransportState, reconnect_delay,
};
