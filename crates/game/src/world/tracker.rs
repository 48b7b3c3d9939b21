use std::collections::HashMap;

use super::Position;

/// Time over which a remote cursor eases from its previous confirmed
/// position to the latest one.
pub const INTERPOLATION_WINDOW_MS: u64 = 120;

#[derive(Debug, Clone)]
struct RemoteEntity {
    prev: Position,
    current: Position,
    confirmed_at_ms: u64,
}

/// Per-remote-entity position history with smoothstep display easing.
/// Positions arrive already validated by the authority; the tracker only
/// interpolates. Roster-based removal is driven by the session.
#[derive(Debug, Default)]
pub struct RemoteEntityTracker {
    entities: HashMap<u32, RemoteEntity>,
}

impl RemoteEntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a confirmed position. For a known entity the previous
    /// sample is rebased onto the currently displayed position so the
    /// cursor never snaps backward.
    pub fn upsert(&mut self, id: u32, position: Position, now_ms: u64) {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.prev = display(entity, now_ms);
                entity.current = position;
                entity.confirmed_at_ms = now_ms;
            }
            None => {
                self.entities.insert(
                    id,
                    RemoteEntity {
                        prev: position,
                        current: position,
                        confirmed_at_ms: now_ms,
                    },
                );
            }
        }
    }

    pub fn remove(&mut self, id: u32) {
        self.entities.remove(&id);
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids currently tracked, for roster diffing.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entities.keys().copied()
    }

    pub fn display_position(&self, id: u32, now_ms: u64) -> Option<Position> {
        self.entities.get(&id).map(|entity| display(entity, now_ms))
    }

    /// Display positions of every tracked entity at `now_ms`.
    pub fn display_all(&self, now_ms: u64) -> impl Iterator<Item = (u32, Position)> + '_ {
        self.entities
            .iter()
            .map(move |(&id, entity)| (id, display(entity, now_ms)))
    }
}

fn display(entity: &RemoteEntity, now_ms: u64) -> Position {
    let elapsed = now_ms.saturating_sub(entity.confirmed_at_ms) as f64;
    let t = (elapsed / INTERPOLATION_WINDOW_MS as f64).clamp(0.0, 1.0);
    let eased = smoothstep(t);

    Position::new(
        lerp(entity.prev.x, entity.current.x, eased),
        lerp(entity.prev.y, entity.current.y, eased),
    )
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(from: i32, to: i32, t: f64) -> i32 {
    (f64::from(from) + f64::from(to - from) * t).round() as i32
}
