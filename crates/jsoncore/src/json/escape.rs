//! Four-digit `\uXXXX` escape accumulation.
//!
//! The accumulator yields raw UTF-16 code units; pairing surrogates into one
//! scalar value is left to the string scanner.

use crate::error::SyntaxError;

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    value: u16,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.value = 0;
        self.len = 0;
    }

    /// Feeds one hex digit. Returns the code unit once four digits are in,
    /// and resets for the next escape.
    pub(crate) fn feed(&mut self, b: u8) -> Result<Option<u16>, SyntaxError> {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(SyntaxError::InvalidUnicodeEscapeChar(char::from(b))),
        };
        self.value = (self.value << 4) | u16::from(digit);
        self.len += 1;
        if self.len == 4 {
            let unit = self.value;
            self.reset();
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }
}

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Combines a surrogate pair into a supplementary-plane scalar value.
pub(crate) fn combine_surrogates(high: u16, low: u16) -> char {
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
