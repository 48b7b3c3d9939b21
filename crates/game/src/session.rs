use std::collections::{BTreeMap, HashSet};

use crate::net::{ClientMessage, DrawnSegment, LevelData, ServerMessage, UpdateData};
use crate::wire::TextEncoding;
use crate::world::{CollisionGrid, Position, RemoteEntityTracker, WorldObject, reconcile};

/// Session phase. `Idle` is the pre-start state: collisions are off, the
/// local cursor echoes raw input and nothing is sent. The first local
/// click switches to `Active` for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub encoding: TextEncoding,
    /// Minimum wall-clock gap between throttled position sends.
    pub move_interval_ms: u64,
    /// A click is admitted only strictly later than this after the last.
    pub click_cooldown_ms: u64,
    /// Minimum gap between drawn segments while dragging.
    pub draw_interval_ms: u64,
    /// Click markers live this long; local markers also suppress the
    /// server echo of the same click within this window.
    pub click_marker_ttl_ms: u64,
    pub line_ttl_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Modern,
            move_interval_ms: 50,
            click_cooldown_ms: 100,
            draw_interval_ms: 50,
            click_marker_ttl_ms: 1000,
            line_ttl_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClickMarker {
    x: u16,
    y: u16,
    at_ms: u64,
    local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineMarker {
    segment: DrawnSegment,
    at_ms: u64,
}

/// Read-only per-frame view for the rendering layer. Remote cursor
/// positions are already eased to `now`; the object registry and the
/// collision grid are read through [`SyncSession::objects`] and
/// [`SyncSession::grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub state: SessionState,
    pub client_id: Option<u32>,
    pub player: Position,
    pub cursors: Vec<(u32, Position)>,
    pub clicks: Vec<(u16, u16)>,
    pub lines: Vec<DrawnSegment>,
    pub online_count: u16,
}

/// Single-threaded orchestrator for one connection to the authority.
///
/// All mutation happens through the inbound message handlers, the raw
/// input methods and `tick`; the caller drives those from one loop and
/// ships [`SyncSession::drain_outbound`] over the transport. The sync
/// token is max-merged from every level/teleport message and echoed on
/// every outbound move and click.
#[derive(Debug)]
pub struct SyncSession {
    config: SessionConfig,
    state: SessionState,
    client_id: Option<u32>,
    sync_token: u32,
    online_count: u16,

    grid: CollisionGrid,
    objects: BTreeMap<u32, WorldObject>,
    tracker: RemoteEntityTracker,

    /// Raw (half-resolution) position the pointer is asking for.
    target: Position,
    /// Reconciled local cursor position.
    player: Position,
    /// Last position actually sent to the authority.
    last_sent: Position,
    last_move_ms: u64,
    last_click_ms: Option<u64>,
    draw_anchor: Option<Position>,
    last_draw_ms: u64,

    clicks: Vec<ClickMarker>,
    lines: Vec<LineMarker>,
    outbox: Vec<ClientMessage>,
}

impl SyncSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            client_id: None,
            sync_token: 0,
            online_count: 0,
            grid: CollisionGrid::new(),
            objects: BTreeMap::new(),
            tracker: RemoteEntityTracker::new(),
            target: Position::default(),
            player: Position::default(),
            last_sent: Position::default(),
            last_move_ms: 0,
            last_click_ms: None,
            draw_anchor: None,
            last_draw_ms: 0,
            clicks: Vec::new(),
            lines: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn client_id(&self) -> Option<u32> {
        self.client_id
    }

    pub fn sync_token(&self) -> u32 {
        self.sync_token
    }

    pub fn online_count(&self) -> u16 {
        self.online_count
    }

    pub fn player_position(&self) -> Position {
        self.player
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Decodes one framed server message and applies it. A malformed
    /// frame is dropped with a warning, never an error.
    pub fn handle_frame(&mut self, bytes: &[u8], now_ms: u64) {
        match ServerMessage::decode(bytes, self.config.encoding) {
            Ok(message) => self.handle_message(message, now_ms),
            Err(err) => log::warn!("dropping malformed server message: {err}"),
        }
    }

    pub fn handle_message(&mut self, message: ServerMessage, now_ms: u64) {
        match message {
            ServerMessage::SetClientId(id) => {
                log::info!("assigned client id {id}");
                self.client_id = Some(id);
            }
            ServerMessage::UpdateData(update) => self.apply_update(update, now_ms),
            ServerMessage::LoadLevel(level) => self.load_level(level),
            ServerMessage::TeleportClient { x, y, sync } => {
                let position = Position::new(i32::from(x), i32::from(y));
                self.player = position;
                self.target = position;
                self.last_sent = position;
                self.merge_token(sync);
            }
        }
    }

    /// Raw pointer input in full-resolution pixels; the world operates on
    /// half-resolution cells, so coordinates are halved on the way in.
    ///
    /// When the reconciled walk stops short of the raw target at a new
    /// position, the pre-move authoritative position and the clipped
    /// result are sent immediately as two messages, so the authority
    /// replays the same collision walk the client displayed.
    pub fn pointer_moved(&mut self, raw_x: i32, raw_y: i32, now_ms: u64) {
        let target = Position::new(raw_x >> 1, raw_y >> 1);
        self.target = target;

        let started = self.state == SessionState::Active;
        let reconciled = reconcile(&self.grid, started, self.last_sent, target);
        self.player = reconciled;

        if started && reconciled != self.last_sent && reconciled != target {
            self.outbox.push(self.move_message(self.last_sent));
            self.outbox.push(self.move_message(reconciled));
            self.last_sent = reconciled;
            self.last_move_ms = now_ms;
        }

        if let Some(anchor) = self.draw_anchor {
            if anchor != self.player
                && now_ms.saturating_sub(self.last_draw_ms) >= self.config.draw_interval_ms
            {
                self.outbox.push(ClientMessage::Draw {
                    start_x: coord(anchor.x),
                    start_y: coord(anchor.y),
                    end_x: coord(self.player.x),
                    end_y: coord(self.player.y),
                });
                self.draw_anchor = Some(self.player);
                self.last_draw_ms = now_ms;
            }
        }
    }

    /// Click admission: strictly more than the cooldown since the last
    /// accepted click, and the cursor must not be mid-collision (the
    /// reconciled position equals the raw target). The first click of a
    /// session also switches `Idle` to `Active`.
    pub fn pointer_clicked(&mut self, now_ms: u64) {
        if self.state == SessionState::Idle {
            log::info!("session active");
            self.state = SessionState::Active;
        }

        let cooled = match self.last_click_ms {
            Some(at) => now_ms.saturating_sub(at) > self.config.click_cooldown_ms,
            None => true,
        };
        if !cooled || self.player != self.target {
            return;
        }

        let (x, y) = (coord(self.player.x), coord(self.player.y));
        self.last_click_ms = Some(now_ms);
        self.outbox.push(ClientMessage::Click {
            x,
            y,
            sync: self.sync_token,
        });
        self.clicks.push(ClickMarker {
            x,
            y,
            at_ms: now_ms,
            local: true,
        });
    }

    /// Begins a drag; drawn segments anchor at the position held down.
    pub fn pointer_pressed(&mut self, now_ms: u64) {
        if self.state == SessionState::Active {
            self.draw_anchor = Some(self.player);
            self.last_draw_ms = now_ms;
        }
    }

    pub fn pointer_released(&mut self) {
        self.draw_anchor = None;
    }

    /// Fixed-cadence driver: ages markers and, while active, sends the
    /// current position if it changed since the last send.
    pub fn tick(&mut self, now_ms: u64) {
        self.clicks
            .retain(|m| now_ms.saturating_sub(m.at_ms) <= self.config.click_marker_ttl_ms);
        self.lines
            .retain(|m| now_ms.saturating_sub(m.at_ms) <= self.config.line_ttl_ms);

        if self.state != SessionState::Active
            || now_ms.saturating_sub(self.last_move_ms) < self.config.move_interval_ms
        {
            return;
        }
        if self.player != self.last_sent {
            let message = self.move_message(self.player);
            self.outbox.push(message);
            self.last_sent = self.player;
            self.last_move_ms = now_ms;
        }
    }

    /// Takes everything queued for the wire, in send order.
    pub fn drain_outbound(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self, now_ms: u64) -> FrameSnapshot {
        let mut cursors: Vec<(u32, Position)> = self.tracker.display_all(now_ms).collect();
        cursors.sort_by_key(|&(id, _)| id);

        FrameSnapshot {
            state: self.state,
            client_id: self.client_id,
            player: self.player,
            cursors,
            clicks: self.clicks.iter().map(|m| (m.x, m.y)).collect(),
            lines: self.lines.iter().map(|m| m.segment).collect(),
            online_count: self.online_count,
        }
    }

    fn move_message(&self, position: Position) -> ClientMessage {
        ClientMessage::Move {
            x: coord(position.x),
            y: coord(position.y),
            sync: self.sync_token,
        }
    }

    fn merge_token(&mut self, token: u32) {
        self.sync_token = self.sync_token.max(token);
    }

    fn apply_update(&mut self, update: UpdateData, now_ms: u64) {
        self.online_count = update.online_count;

        let present: HashSet<u32> = update.players.iter().map(|p| p.id).collect();
        let gone: Vec<u32> = self.tracker.ids().filter(|id| !present.contains(id)).collect();
        for id in gone {
            self.tracker.remove(id);
        }
        for player in &update.players {
            if Some(player.id) == self.client_id {
                continue;
            }
            self.tracker.upsert(
                player.id,
                Position::new(i32::from(player.x), i32::from(player.y)),
                now_ms,
            );
        }

        for &(x, y) in &update.clicks {
            // The authority echoes our own clicks back; a live local
            // marker on the same cell stands in for the echo.
            let suppressed = self.clicks.iter().any(|m| {
                m.local
                    && m.x == x
                    && m.y == y
                    && now_ms.saturating_sub(m.at_ms) <= self.config.click_marker_ttl_ms
            });
            if !suppressed {
                self.clicks.push(ClickMarker {
                    x,
                    y,
                    at_ms: now_ms,
                    local: false,
                });
            }
        }

        for id in update.removed_objects {
            self.remove_object(id);
        }
        for object in update.updated_objects {
            self.install_object(object);
        }

        for segment in update.lines {
            self.lines.push(LineMarker {
                segment,
                at_ms: now_ms,
            });
        }
    }

    fn load_level(&mut self, level: LevelData) {
        log::debug!(
            "loading level: {} objects, start ({}, {})",
            level.objects.len(),
            level.start_x,
            level.start_y
        );

        self.grid.reset();
        self.objects.clear();
        self.clicks.clear();
        self.lines.clear();
        for object in level.objects {
            self.install_object(object);
        }

        let start = Position::new(i32::from(level.start_x), i32::from(level.start_y));
        self.player = start;
        self.target = start;
        self.last_sent = start;
        self.merge_token(level.sync);
    }

    fn remove_object(&mut self, id: u32) {
        if let Some(old) = self.objects.remove(&id) {
            if let Some(span) = old.wall_span() {
                self.grid.set_span(span.x, span.y, span.w, span.h, false);
            }
        }
    }

    /// Replaces any object with the same id, clearing its old wall span
    /// before the new one is set.
    fn install_object(&mut self, object: WorldObject) {
        self.remove_object(object.id());
        if let Some(span) = object.wall_span() {
            self.grid.set_span(span.x, span.y, span.w, span.h, true);
        }
        self.objects.insert(object.id(), object);
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn coord(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}
