use super::TextEncoding;

/// Serializes `(value, bit width)` fields into a minimal byte sequence,
/// zero-padding the final byte.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot encoding of a declarative field list.
    pub fn fast(fields: &[(u32, u32)]) -> Vec<u8> {
        let mut writer = Self::new();
        for &(value, width) in fields {
            writer.push(value, width);
        }
        writer.into_bytes()
    }

    /// Appends the low `width` bits (1..=32) of `value`, MSB first.
    pub fn push(&mut self, value: u32, width: u32) {
        debug_assert!((1..=32).contains(&width));
        for i in (0..width).rev() {
            let index = self.bit_len >> 3;
            if index == self.bytes.len() {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            self.bytes[index] |= bit << (7 - (self.bit_len & 7));
            self.bit_len += 1;
        }
    }

    /// Appends a NUL-terminated string in the given encoding.
    ///
    /// Legacy units are written as their minimal big-endian bytes; a
    /// non-final unit only survives the continuation scheme when its last
    /// byte has a clear high bit.
    pub fn push_text(&mut self, text: &str, encoding: TextEncoding) {
        match encoding {
            TextEncoding::Legacy => {
                for unit in text.encode_utf16() {
                    if unit > 0xff {
                        self.push(u32::from(unit >> 8), 8);
                    }
                    self.push(u32::from(unit & 0xff), 8);
                }
                self.push(0, 8);
            }
            TextEncoding::Modern => {
                for unit in text.encode_utf16() {
                    self.push(u32::from(unit), 16);
                }
                self.push(0, 16);
            }
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
