//! Smile binary format.
//!
//! Same token grammar as the text format, written as single-byte opcodes
//! with length prefixes and back-references to previously written names and
//! short values. A stream starts with a 4-byte header: `:)\n` followed by a
//! byte carrying the version in the high nibble and the feature flags in
//! the low bits.

mod generator;
mod options;
mod parser;
mod shared;
mod vint;

pub use generator::SmileGenerator;
pub use options::{SharedOverflow, SmileOptions};
pub use parser::SmileParser;
pub use shared::{MAX_SHARED_STRINGS, MAX_SHARED_VALUE_BYTES};

use crate::error::SyntaxError;

/// First three header bytes.
pub const MAGIC: [u8; 3] = [0x3A, 0x29, 0x0A];

/// Format version written into the header.
pub const VERSION: u8 = 0;

const FLAG_SHARED_NAMES: u8 = 0x01;
const FLAG_SHARED_VALUES: u8 = 0x02;
const FLAG_RAW_BINARY: u8 = 0x04;

pub(crate) mod opcode {
    // Value mode.
    pub const EMPTY_STRING: u8 = 0x20;
    pub const NULL: u8 = 0x21;
    pub const FALSE: u8 = 0x22;
    pub const TRUE: u8 = 0x23;
    pub const INT32: u8 = 0x24;
    pub const INT64: u8 = 0x25;
    pub const BIG_INTEGER: u8 = 0x26;
    pub const FLOAT32: u8 = 0x28;
    pub const FLOAT64: u8 = 0x29;
    pub const BIG_DECIMAL: u8 = 0x2A;
    pub const TINY_ASCII: u8 = 0x40;
    pub const SHORT_ASCII: u8 = 0x60;
    pub const TINY_UNICODE: u8 = 0x80;
    pub const SHORT_UNICODE: u8 = 0xA0;
    pub const SMALL_INT: u8 = 0xC0;
    pub const LONG_ASCII: u8 = 0xE0;
    pub const LONG_UNICODE: u8 = 0xE4;
    pub const BINARY_7BIT: u8 = 0xE8;
    pub const LONG_SHARED_VALUE: u8 = 0xEC;
    pub const START_ARRAY: u8 = 0xF8;
    pub const END_ARRAY: u8 = 0xF9;
    pub const START_OBJECT: u8 = 0xFA;
    pub const END_OBJECT: u8 = 0xFB;
    pub const END_STRING: u8 = 0xFC;
    pub const RAW_BINARY: u8 = 0xFD;
    pub const END_OF_CONTENT: u8 = 0xFF;

    // Key mode.
    pub const KEY_EMPTY: u8 = 0x20;
    pub const KEY_LONG_SHARED: u8 = 0x30;
    pub const KEY_LONG: u8 = 0x34;
    pub const KEY_SHORT_SHARED: u8 = 0x40;
    pub const KEY_SHORT_ASCII: u8 = 0x80;
    pub const KEY_SHORT_UNICODE: u8 = 0xC0;
}

/// Decoded stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SmileHeader {
    pub version: u8,
    pub shared_names: bool,
    pub shared_values: bool,
    pub raw_binary: bool,
}

impl SmileHeader {
    /// Header announcing the features enabled in `options`.
    #[must_use]
    pub fn from_options(options: &SmileOptions) -> Self {
        Self {
            version: VERSION,
            shared_names: options.shared_names,
            shared_values: options.shared_values,
            raw_binary: options.raw_binary,
        }
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        let mut flags = self.version << 4;
        if self.shared_names {
            flags |= FLAG_SHARED_NAMES;
        }
        if self.shared_values {
            flags |= FLAG_SHARED_VALUES;
        }
        if self.raw_binary {
            flags |= FLAG_RAW_BINARY;
        }
        [MAGIC[0], MAGIC[1], MAGIC[2], flags]
    }

    /// # Errors
    ///
    /// [`SyntaxError::InvalidHeader`] if the magic bytes do not match,
    /// [`SyntaxError::UnsupportedVersion`] for a version other than 0.
    pub fn parse(bytes: [u8; 4]) -> Result<Self, SyntaxError> {
        if bytes[..3] != MAGIC {
            return Err(SyntaxError::InvalidHeader);
        }
        let flags = bytes[3];
        let version = flags >> 4;
        if version != VERSION {
            return Err(SyntaxError::UnsupportedVersion(version));
        }
        Ok(Self {
            version,
            shared_names: flags & FLAG_SHARED_NAMES != 0,
            shared_values: flags & FLAG_SHARED_VALUES != 0,
            raw_binary: flags & FLAG_RAW_BINARY != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_bytes() {
        let header = SmileHeader::from_options(&SmileOptions::default());
        assert_eq!(header.to_bytes(), [0x3A, 0x29, 0x0A, 0x01]);

        let all = SmileHeader {
            version: 0,
            shared_names: true,
            shared_values: true,
            raw_binary: true,
        };
        assert_eq!(all.to_bytes()[3], 0x07);
        assert_eq!(SmileHeader::parse(all.to_bytes()), Ok(all));
    }

    #[test]
    fn bad_headers() {
        assert_eq!(
            SmileHeader::parse(*b"{}\n\x00"),
            Err(SyntaxError::InvalidHeader)
        );
        assert_eq!(
            SmileHeader::parse([0x3A, 0x29, 0x0A, 0x13]),
            Err(SyntaxError::UnsupportedVersion(1))
        );
    }
}
