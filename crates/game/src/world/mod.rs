mod grid;
mod motion;
mod objects;
mod tracker;

pub use grid::{CollisionGrid, GRID_HEIGHT, GRID_WIDTH};
pub use motion::reconcile;
pub use objects::{Span, WorldObject};
pub use tracker::{INTERPOLATION_WINDOW_MS, RemoteEntityTracker};

/// Integer coordinate in the half-resolution grid space,
/// 0..400 x 0..300 when in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
