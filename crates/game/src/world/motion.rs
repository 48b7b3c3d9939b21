use super::{CollisionGrid, Position};

/// Computes the farthest reachable valid position along the straight line
/// from `from` toward `to`, stopping before the first blocked cell.
///
/// The walk is an integer Bresenham line with the error term seeded at
/// half the major length; ties on `|dx| <= |dy|` pick Y as the major
/// axis. The server runs the same walk, so every decision here is part
/// of the wire contract.
///
/// While `started` is false all collision checks are disabled and the
/// walk degenerates to returning `to`. A blocked `from` is returned
/// unchanged.
pub fn reconcile(grid: &CollisionGrid, started: bool, from: Position, to: Position) -> Position {
    let blocked = |x: i32, y: i32| started && grid.is_blocked(x, y);

    if blocked(from.x, from.y) {
        return from;
    }
    if from == to {
        return to;
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let sx = dx.signum();
    let sy = dy.signum();

    // Major-only step; the diagonal step advances both axes by (sx, sy).
    let (mut major, mut minor) = (dx.abs(), dy.abs());
    let (mut step_x, mut step_y) = (sx, 0);
    if major <= minor {
        std::mem::swap(&mut major, &mut minor);
        step_x = 0;
        step_y = sy;
    }

    let (mut x, mut y) = (from.x, from.y);
    let mut last = from;
    let mut err = major >> 1;
    let mut i = 0;

    while i <= major && !blocked(x, y) {
        last = Position::new(x, y);
        err += minor;
        if err >= major {
            err -= major;
            x += sx;
            y += sy;
        } else {
            x += step_x;
            y += step_y;
        }
        i += 1;
    }

    last
}
