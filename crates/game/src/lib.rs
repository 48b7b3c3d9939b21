//! Core client logic for a shared-cursor world: bit-packed wire codec,
//! reconnecting transport, collision grid with line-walk reconciliation,
//! remote cursor interpolation and the session state machine tying them
//! together. Rendering and input capture live outside this crate and
//! talk to it through [`SyncSession`].

pub mod net;
pub mod session;
pub mod wire;
pub mod world;

pub use net::{ClientMessage, ServerMessage, Transport, TransportEvent, TransportState};
pub use session::{FrameSnapshot, SessionConfig, SessionState, SyncSession};
pub use wire::{BitReader, BitWriter, DecodeError, TextEncoding};
pub use world::{CollisionGrid, Position, RemoteEntityTracker, WorldObject, reconcile};
