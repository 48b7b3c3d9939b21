mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

/// Text scheme used by the deployment. Fixed configuration, never
/// negotiated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// 8-bit runs with the continuation bit in the MSB, NUL-terminated,
    /// bytes assembled into a UTF-16 code unit.
    Legacy,
    /// One 16-bit code unit per character, NUL-terminated.
    #[default]
    Modern,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer underrun")]
    BufferUnderrun,
    #[error("unknown object type [{0}]")]
    UnknownObjectType(u8),
    #[error("unknown message type [{0}]")]
    UnknownMessageType(u8),
}

/// Formats a 32-bit wire color as a `#rrggbb` string, zero-padded to six
/// hex digits.
pub fn color_hex(value: u32) -> String {
    format!("#{value:06x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_padding() {
        assert_eq!(color_hex(0x000000), "#000000");
        assert_eq!(color_hex(0x0000ff), "#0000ff");
        assert_eq!(color_hex(0xabcdef), "#abcdef");
        assert_eq!(color_hex(0xc0ffee), "#c0ffee");
    }
}
