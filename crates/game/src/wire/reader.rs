use super::{DecodeError, TextEncoding, color_hex};

/// Cursor over an immutable byte sequence that yields arbitrary-width
/// unsigned integers in big-endian bit order.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Reads the next `width` bits (1..=32) as an unsigned integer.
    pub fn read_bits(&mut self, width: u32) -> Result<u32, DecodeError> {
        debug_assert!((1..=32).contains(&width));
        if self.remaining_bits() < width as usize {
            return Err(DecodeError::BufferUnderrun);
        }

        let mut value = 0u32;
        for _ in 0..width {
            let byte = self.data[self.bit_pos >> 3];
            let bit = (byte >> (7 - (self.bit_pos & 7))) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit_pos += 1;
        }
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_bits(32)
    }

    /// Reads a 32-bit color as a `#rrggbb` string.
    pub fn read_color(&mut self) -> Result<String, DecodeError> {
        Ok(color_hex(self.read_u32()?))
    }

    /// Reads a NUL-terminated string in the given encoding.
    ///
    /// Legacy scheme: bytes with the high bit set continue the current
    /// UTF-16 code unit (`unit = unit << 8 | byte`); a clear high bit
    /// flushes it. A nonzero accumulator left at the terminator is
    /// flushed as a final unit.
    pub fn read_text(&mut self, encoding: TextEncoding) -> Result<String, DecodeError> {
        let mut units: Vec<u16> = Vec::new();

        match encoding {
            TextEncoding::Legacy => {
                let mut unit: u32 = 0;
                loop {
                    let byte = self.read_bits(8)?;
                    if byte == 0 {
                        break;
                    }
                    unit = (unit << 8) | byte;
                    if byte & 0x80 == 0 {
                        units.push(unit as u16);
                        unit = 0;
                    }
                }
                if unit != 0 {
                    units.push(unit as u16);
                }
            }
            TextEncoding::Modern => loop {
                let unit = self.read_bits(16)? as u16;
                if unit == 0 {
                    break;
                }
                units.push(unit);
            },
        }

        Ok(String::from_utf16_lossy(&units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_big_endian_order() {
        let mut reader = BitReader::new(&[0b1011_0010, 0b0100_0000]);

        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
        assert_eq!(reader.read_bits(6).unwrap(), 0b001001);
        assert_eq!(reader.remaining_bits(), 6);
    }

    #[test]
    fn test_read_underrun() {
        let mut reader = BitReader::new(&[0xff]);

        assert_eq!(reader.read_bits(8).unwrap(), 0xff);
        assert_eq!(reader.read_bits(1), Err(DecodeError::BufferUnderrun));
    }

    #[test]
    fn test_read_underrun_mid_field() {
        let mut reader = BitReader::new(&[0xff, 0xff]);

        assert_eq!(reader.read_bits(10).unwrap(), 0x3ff);
        assert_eq!(reader.read_bits(8), Err(DecodeError::BufferUnderrun));
    }

    #[test]
    fn test_read_helpers() {
        let mut reader = BitReader::new(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde]);

        assert_eq!(reader.read_u8().unwrap(), 0x12);
        assert_eq!(reader.read_u16().unwrap(), 0x3456);
        assert_eq!(reader.read_u32().unwrap(), 0x789a_bcde);
    }

    #[test]
    fn test_read_color_string() {
        let mut reader = BitReader::new(&[0x00, 0x00, 0x00, 0x2a]);
        assert_eq!(reader.read_color().unwrap(), "#00002a");
    }

    #[test]
    fn test_read_text_modern() {
        let mut reader = BitReader::new(&[0x00, b'h', 0x00, b'i', 0x00, 0x00]);
        assert_eq!(reader.read_text(TextEncoding::Modern).unwrap(), "hi");
    }

    #[test]
    fn test_read_text_legacy_ascii() {
        let mut reader = BitReader::new(&[b'o', b'k', 0x00]);
        assert_eq!(reader.read_text(TextEncoding::Legacy).unwrap(), "ok");
    }

    #[test]
    fn test_read_text_legacy_continuation() {
        // 0x84 carries the continuation bit and stays in the accumulator,
        // so the flushed unit is 0x8422.
        let mut reader = BitReader::new(&[0x84, 0x22, b'!', 0x00]);
        assert_eq!(
            reader.read_text(TextEncoding::Legacy).unwrap(),
            "\u{8422}!"
        );
    }

    #[test]
    fn test_read_text_legacy_trailing_accumulator() {
        // Terminator hit while a continuation run is still open.
        let mut reader = BitReader::new(&[0x84, 0x00]);
        assert_eq!(reader.read_text(TextEncoding::Legacy).unwrap(), "\u{84}");
    }

    #[test]
    fn test_read_text_empty() {
        let mut modern = BitReader::new(&[0x00, 0x00]);
        assert_eq!(modern.read_text(TextEncoding::Modern).unwrap(), "");

        let mut legacy = BitReader::new(&[0x00]);
        assert_eq!(legacy.read_text(TextEncoding::Legacy).unwrap(), "");
    }
}
