pub const GRID_WIDTH: i32 = 400;
pub const GRID_HEIGHT: i32 = 300;

/// Dense occupancy bitmap over the half-resolution playfield. Cells are
/// mutated only through `set_span`; everything outside the grid counts
/// as blocked.
#[derive(Debug)]
pub struct CollisionGrid {
    cells: Vec<bool>,
}

impl Default for CollisionGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![false; (GRID_WIDTH * GRID_HEIGHT) as usize],
        }
    }

    /// Marks or clears every cell in the half-open rectangle. Callers
    /// validate bounds upstream.
    pub fn set_span(&mut self, x: u16, y: u16, w: u16, h: u16, blocked: bool) {
        for cy in y..y.saturating_add(h) {
            for cx in x..x.saturating_add(w) {
                debug_assert!(i32::from(cx) < GRID_WIDTH && i32::from(cy) < GRID_HEIGHT);
                let index = usize::from(cy) * GRID_WIDTH as usize + usize::from(cx);
                if let Some(cell) = self.cells.get_mut(index) {
                    *cell = blocked;
                }
            }
        }
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= GRID_WIDTH || y < 0 || y >= GRID_HEIGHT {
            return true;
        }
        self.cells[y as usize * GRID_WIDTH as usize + x as usize]
    }

    pub fn reset(&mut self) {
        self.cells.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_marks_half_open_rect() {
        let mut grid = CollisionGrid::new();
        grid.set_span(10, 10, 5, 5, true);

        assert!(grid.is_blocked(10, 10));
        assert!(grid.is_blocked(14, 14));
        assert!(!grid.is_blocked(15, 10));
        assert!(!grid.is_blocked(10, 15));
        assert!(!grid.is_blocked(9, 12));
    }

    #[test]
    fn test_span_clear() {
        let mut grid = CollisionGrid::new();
        grid.set_span(0, 0, 3, 3, true);
        grid.set_span(0, 0, 3, 3, false);

        assert!(!grid.is_blocked(1, 1));
    }

    #[test]
    fn test_off_grid_is_blocked() {
        let grid = CollisionGrid::new();

        assert!(grid.is_blocked(-1, 0));
        assert!(grid.is_blocked(0, -1));
        assert!(grid.is_blocked(GRID_WIDTH, 0));
        assert!(grid.is_blocked(0, GRID_HEIGHT));
        assert!(!grid.is_blocked(0, 0));
        assert!(!grid.is_blocked(GRID_WIDTH - 1, GRID_HEIGHT - 1));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut grid = CollisionGrid::new();
        grid.set_span(100, 100, 20, 20, true);
        grid.reset();

        assert!(!grid.is_blocked(105, 105));
    }
}
