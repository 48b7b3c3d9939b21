use crate::wire::{BitReader, BitWriter, DecodeError, TextEncoding};
use crate::world::WorldObject;

pub const CLIENT_MOVE: u8 = 1;
pub const CLIENT_CLICK: u8 = 2;
pub const CLIENT_DRAW: u8 = 3;

pub const SERVER_SET_CLIENT_ID: u8 = 0;
pub const SERVER_UPDATE_DATA: u8 = 1;
pub const SERVER_LOAD_LEVEL: u8 = 4;
pub const SERVER_TELEPORT_CLIENT: u8 = 5;

/// Outbound messages. Coordinates are half-resolution grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Move {
        x: u16,
        y: u16,
        sync: u32,
    },
    Click {
        x: u16,
        y: u16,
        sync: u32,
    },
    Draw {
        start_x: u16,
        start_y: u16,
        end_x: u16,
        end_y: u16,
    },
}

impl ClientMessage {
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            ClientMessage::Move { x, y, sync } => BitWriter::fast(&[
                (u32::from(CLIENT_MOVE), 8),
                (u32::from(x), 16),
                (u32::from(y), 16),
                (sync, 32),
            ]),
            ClientMessage::Click { x, y, sync } => BitWriter::fast(&[
                (u32::from(CLIENT_CLICK), 8),
                (u32::from(x), 16),
                (u32::from(y), 16),
                (sync, 32),
            ]),
            ClientMessage::Draw {
                start_x,
                start_y,
                end_x,
                end_y,
            } => BitWriter::fast(&[
                (u32::from(CLIENT_DRAW), 8),
                (u32::from(start_x), 16),
                (u32::from(start_y), 16),
                (u32::from(end_x), 16),
                (u32::from(end_y), 16),
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub id: u32,
    pub x: u16,
    pub y: u16,
    pub color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnSegment {
    pub start_x: u16,
    pub start_y: u16,
    pub end_x: u16,
    pub end_y: u16,
}

/// Per-tick world diff: the full player roster, confirmed clicks, the
/// object remove/add blocks, drawn segments, and the online counter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateData {
    pub players: Vec<PlayerState>,
    pub clicks: Vec<(u16, u16)>,
    pub removed_objects: Vec<u32>,
    pub updated_objects: Vec<WorldObject>,
    pub lines: Vec<DrawnSegment>,
    pub online_count: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub start_x: u16,
    pub start_y: u16,
    pub objects: Vec<WorldObject>,
    pub sync: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SetClientId(u32),
    UpdateData(UpdateData),
    LoadLevel(LevelData),
    TeleportClient { x: u16, y: u16, sync: u32 },
}

impl ServerMessage {
    /// Decodes one framed server message. A malformed world object inside
    /// a batch is skipped with a warning; any other decode failure drops
    /// the whole message.
    pub fn decode(data: &[u8], encoding: TextEncoding) -> Result<Self, DecodeError> {
        let mut reader = BitReader::new(data);
        let tag = reader.read_u8()?;

        match tag {
            SERVER_SET_CLIENT_ID => Ok(ServerMessage::SetClientId(reader.read_u32()?)),
            SERVER_UPDATE_DATA => Ok(ServerMessage::UpdateData(Self::decode_update(
                &mut reader,
                encoding,
            )?)),
            SERVER_LOAD_LEVEL => {
                let start_x = reader.read_u16()?;
                let start_y = reader.read_u16()?;
                let objects = decode_object_batch(&mut reader, encoding)?;
                let sync = reader.read_u32()?;
                Ok(ServerMessage::LoadLevel(LevelData {
                    start_x,
                    start_y,
                    objects,
                    sync,
                }))
            }
            SERVER_TELEPORT_CLIENT => Ok(ServerMessage::TeleportClient {
                x: reader.read_u16()?,
                y: reader.read_u16()?,
                sync: reader.read_u32()?,
            }),
            _ => Err(DecodeError::UnknownMessageType(tag)),
        }
    }

    fn decode_update(
        reader: &mut BitReader<'_>,
        encoding: TextEncoding,
    ) -> Result<UpdateData, DecodeError> {
        let player_count = reader.read_u16()?;
        let mut players = Vec::with_capacity(usize::from(player_count));
        for _ in 0..player_count {
            players.push(PlayerState {
                id: reader.read_u32()?,
                x: reader.read_u16()?,
                y: reader.read_u16()?,
                color: reader.read_u32()?,
            });
        }

        let click_count = reader.read_u16()?;
        let mut clicks = Vec::with_capacity(usize::from(click_count));
        for _ in 0..click_count {
            clicks.push((reader.read_u16()?, reader.read_u16()?));
        }

        let removed_count = reader.read_u16()?;
        let mut removed_objects = Vec::with_capacity(usize::from(removed_count));
        for _ in 0..removed_count {
            removed_objects.push(reader.read_u32()?);
        }

        let updated_objects = decode_object_batch(reader, encoding)?;

        let line_count = reader.read_u16()?;
        let mut lines = Vec::with_capacity(usize::from(line_count));
        for _ in 0..line_count {
            lines.push(DrawnSegment {
                start_x: reader.read_u16()?,
                start_y: reader.read_u16()?,
                end_x: reader.read_u16()?,
                end_y: reader.read_u16()?,
            });
        }

        let online_count = reader.read_u16()?;

        Ok(UpdateData {
            players,
            clicks,
            removed_objects,
            updated_objects,
            lines,
            online_count,
        })
    }
}

/// Reads `count:16` objects, recovering per object: a malformed entry is
/// logged and skipped while the rest of the batch is attempted.
fn decode_object_batch(
    reader: &mut BitReader<'_>,
    encoding: TextEncoding,
) -> Result<Vec<WorldObject>, DecodeError> {
    let count = reader.read_u16()?;
    let mut objects = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        match WorldObject::decode(reader, encoding) {
            Ok(object) => objects.push(object),
            Err(err) => log::warn!("skipping malformed world object: {err}"),
        }
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Span;

    #[test]
    fn test_encode_move() {
        let bytes = ClientMessage::Move {
            x: 250,
            y: 120,
            sync: 7,
        }
        .encode();

        assert_eq!(bytes, vec![1, 0, 250, 0, 120, 0, 0, 0, 7]);
    }

    #[test]
    fn test_encode_click_and_draw() {
        let click = ClientMessage::Click {
            x: 1,
            y: 2,
            sync: 0x0102_0304,
        }
        .encode();
        assert_eq!(click, vec![2, 0, 1, 0, 2, 1, 2, 3, 4]);

        let draw = ClientMessage::Draw {
            start_x: 10,
            start_y: 11,
            end_x: 12,
            end_y: 13,
        }
        .encode();
        assert_eq!(draw, vec![3, 0, 10, 0, 11, 0, 12, 0, 13]);
    }

    #[test]
    fn test_decode_set_client_id() {
        let bytes = BitWriter::fast(&[(u32::from(SERVER_SET_CLIENT_ID), 8), (42, 32)]);

        assert_eq!(
            ServerMessage::decode(&bytes, TextEncoding::Modern).unwrap(),
            ServerMessage::SetClientId(42)
        );
    }

    #[test]
    fn test_decode_teleport() {
        let bytes = BitWriter::fast(&[
            (u32::from(SERVER_TELEPORT_CLIENT), 8),
            (30, 16),
            (40, 16),
            (9, 32),
        ]);

        assert_eq!(
            ServerMessage::decode(&bytes, TextEncoding::Modern).unwrap(),
            ServerMessage::TeleportClient {
                x: 30,
                y: 40,
                sync: 9
            }
        );
    }

    #[test]
    fn test_decode_load_level() {
        let mut writer = BitWriter::new();
        writer.push(u32::from(SERVER_LOAD_LEVEL), 8);
        writer.push(100, 16);
        writer.push(80, 16);
        writer.push(1, 16);
        // wall id=7 at (10,10) 5x5
        writer.push(7, 32);
        writer.push(1, 8);
        writer.push(10, 16);
        writer.push(10, 16);
        writer.push(5, 16);
        writer.push(5, 16);
        writer.push(0x333333, 32);
        writer.push(55, 32);
        let bytes = writer.into_bytes();

        let message = ServerMessage::decode(&bytes, TextEncoding::Modern).unwrap();
        let ServerMessage::LoadLevel(level) = message else {
            panic!("expected LoadLevel, got {message:?}");
        };

        assert_eq!((level.start_x, level.start_y), (100, 80));
        assert_eq!(level.sync, 55);
        assert_eq!(level.objects.len(), 1);
        assert_eq!(
            level.objects[0].wall_span(),
            Some(Span {
                x: 10,
                y: 10,
                w: 5,
                h: 5
            })
        );
    }

    #[test]
    fn test_decode_update_data() {
        let mut writer = BitWriter::new();
        writer.push(u32::from(SERVER_UPDATE_DATA), 8);
        // two players
        writer.push(2, 16);
        writer.push(5, 32);
        writer.push(100, 16);
        writer.push(50, 16);
        writer.push(0xff0000, 32);
        writer.push(6, 32);
        writer.push(200, 16);
        writer.push(150, 16);
        writer.push(0x00ff00, 32);
        // one click
        writer.push(1, 16);
        writer.push(20, 16);
        writer.push(30, 16);
        // one removed object
        writer.push(1, 16);
        writer.push(7, 32);
        // one added object (teleport)
        writer.push(1, 16);
        writer.push(8, 32);
        writer.push(2, 8);
        writer.push(0, 16);
        writer.push(0, 16);
        writer.push(2, 16);
        writer.push(2, 16);
        writer.push(0, 8);
        // one line
        writer.push(1, 16);
        writer.push(1, 16);
        writer.push(2, 16);
        writer.push(3, 16);
        writer.push(4, 16);
        // online count
        writer.push(12, 16);
        let bytes = writer.into_bytes();

        let message = ServerMessage::decode(&bytes, TextEncoding::Modern).unwrap();
        let ServerMessage::UpdateData(update) = message else {
            panic!("expected UpdateData, got {message:?}");
        };

        assert_eq!(update.players.len(), 2);
        assert_eq!(update.players[0].id, 5);
        assert_eq!(update.players[1].color, 0x00ff00);
        assert_eq!(update.clicks, vec![(20, 30)]);
        assert_eq!(update.removed_objects, vec![7]);
        assert_eq!(update.updated_objects.len(), 1);
        assert_eq!(update.updated_objects[0].id(), 8);
        assert_eq!(
            update.lines,
            vec![DrawnSegment {
                start_x: 1,
                start_y: 2,
                end_x: 3,
                end_y: 4
            }]
        );
        assert_eq!(update.online_count, 12);
    }

    #[test]
    fn test_decode_unknown_message_dropped() {
        let bytes = BitWriter::fast(&[(99, 8), (1, 32)]);

        assert_eq!(
            ServerMessage::decode(&bytes, TextEncoding::Modern),
            Err(DecodeError::UnknownMessageType(99))
        );
    }

    #[test]
    fn test_decode_truncated_message_dropped() {
        let bytes = BitWriter::fast(&[(u32::from(SERVER_TELEPORT_CLIENT), 8), (30, 16)]);

        assert_eq!(
            ServerMessage::decode(&bytes, TextEncoding::Modern),
            Err(DecodeError::BufferUnderrun)
        );
    }

    #[test]
    fn test_empty_update_data() {
        let bytes = BitWriter::fast(&[
            (u32::from(SERVER_UPDATE_DATA), 8),
            (0, 16),
            (0, 16),
            (0, 16),
            (0, 16),
            (0, 16),
            (3, 16),
        ]);

        let message = ServerMessage::decode(&bytes, TextEncoding::Modern).unwrap();
        let ServerMessage::UpdateData(update) = message else {
            panic!("expected UpdateData");
        };

        assert!(update.players.is_empty());
        assert_eq!(update.online_count, 3);
    }
}
