use crate::wire::{BitReader, DecodeError, TextEncoding};

/// Axis-aligned rectangle of grid cells set or cleared as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

/// World object variants, tagged on the wire by a type byte following the
/// 32-bit id. Wall geometry feeds the collision grid; the session applies
/// that side effect when a decoded object is installed.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldObject {
    Text {
        id: u32,
        x: u16,
        y: u16,
        size: u8,
        centered: bool,
        color: String,
        text: String,
    },
    Wall {
        id: u32,
        span: Span,
        color: String,
    },
    Teleport {
        id: u32,
        span: Span,
        bad: bool,
    },
    AreaCounter {
        id: u32,
        span: Span,
        count: u16,
        color: String,
    },
    Button {
        id: u32,
        span: Span,
        count: u16,
        color: String,
    },
}

impl WorldObject {
    /// Decodes one object: `id:32`, `type:8`, then type-specific fields.
    pub fn decode(reader: &mut BitReader<'_>, encoding: TextEncoding) -> Result<Self, DecodeError> {
        let id = reader.read_u32()?;
        let tag = reader.read_u8()?;

        match tag {
            0 => {
                let x = reader.read_u16()?;
                let y = reader.read_u16()?;
                let size = reader.read_u8()?;
                let centered = reader.read_u8()? != 0;
                let color = reader.read_color()?;
                let text = reader.read_text(encoding)?;
                Ok(WorldObject::Text {
                    id,
                    x,
                    y,
                    size,
                    centered,
                    color,
                    text,
                })
            }
            1 => Ok(WorldObject::Wall {
                id,
                span: Self::decode_span(reader)?,
                color: reader.read_color()?,
            }),
            2 => Ok(WorldObject::Teleport {
                id,
                span: Self::decode_span(reader)?,
                bad: reader.read_u8()? != 0,
            }),
            3 => {
                let span = Self::decode_span(reader)?;
                let count = reader.read_u16()?;
                let color = reader.read_color()?;
                Ok(WorldObject::AreaCounter {
                    id,
                    span,
                    count,
                    color,
                })
            }
            4 => {
                let span = Self::decode_span(reader)?;
                let count = reader.read_u16()?;
                let color = reader.read_color()?;
                Ok(WorldObject::Button {
                    id,
                    span,
                    count,
                    color,
                })
            }
            _ => Err(DecodeError::UnknownObjectType(tag)),
        }
    }

    fn decode_span(reader: &mut BitReader<'_>) -> Result<Span, DecodeError> {
        Ok(Span {
            x: reader.read_u16()?,
            y: reader.read_u16()?,
            w: reader.read_u16()?,
            h: reader.read_u16()?,
        })
    }

    pub fn id(&self) -> u32 {
        match *self {
            WorldObject::Text { id, .. }
            | WorldObject::Wall { id, .. }
            | WorldObject::Teleport { id, .. }
            | WorldObject::AreaCounter { id, .. }
            | WorldObject::Button { id, .. } => id,
        }
    }

    /// The grid span this object blocks, if any. Only walls collide.
    pub fn wall_span(&self) -> Option<Span> {
        match *self {
            WorldObject::Wall { span, .. } => Some(span),
            _ => None,
        }
    }
}
