//! Input encoding detection and transcoding to UTF-8.
//!
//! The tokenizer itself only reads UTF-8. Byte input is sniffed for a byte
//! order mark or, failing that, for the zero-byte pattern that the first
//! (necessarily ASCII) character of a JSON document leaves in UTF-16 and
//! UTF-32. Wide encodings are decoded on the fly by [`WideReader`];
//! character input is encoded by [`CharsReader`].

use std::io::{self, Read};

/// Text encodings accepted for byte input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JsonEncoding {
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

impl JsonEncoding {
    /// Width of one code unit in bytes.
    #[must_use]
    pub fn unit_len(self) -> usize {
        match self {
            Self::Utf8 => 1,
            Self::Utf16Be | Self::Utf16Le => 2,
            Self::Utf32Be | Self::Utf32Le => 4,
        }
    }

    #[must_use]
    pub fn is_big_endian(self) -> bool {
        matches!(self, Self::Utf16Be | Self::Utf32Be)
    }

    /// Detects the encoding from up to four leading bytes. Returns the
    /// encoding and the length of the byte order mark to skip.
    #[must_use]
    pub fn detect(prefix: &[u8]) -> (Self, usize) {
        match *prefix {
            [0xEF, 0xBB, 0xBF, ..] => (Self::Utf8, 3),
            [0x00, 0x00, 0xFE, 0xFF, ..] => (Self::Utf32Be, 4),
            [0xFF, 0xFE, 0x00, 0x00, ..] => (Self::Utf32Le, 4),
            [0xFE, 0xFF, ..] => (Self::Utf16Be, 2),
            [0xFF, 0xFE, ..] => (Self::Utf16Le, 2),
            [0x00, 0x00, 0x00, b, ..] if b != 0 => (Self::Utf32Be, 0),
            [a, 0x00, 0x00, 0x00, ..] if a != 0 => (Self::Utf32Le, 0),
            [0x00, b, ..] if b != 0 => (Self::Utf16Be, 0),
            [a, 0x00, ..] if a != 0 => (Self::Utf16Le, 0),
            _ => (Self::Utf8, 0),
        }
    }
}

/// A reader with up to four already-read bytes in front of it.
#[derive(Debug)]
pub struct Prefixed<R> {
    prefix: [u8; 4],
    start: usize,
    end: usize,
    inner: R,
}

impl<R: Read> Read for Prefixed<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.start < self.end {
            let n = (self.end - self.start).min(out.len());
            out[..n].copy_from_slice(&self.prefix[self.start..self.start + n]);
            self.start += n;
            return Ok(n);
        }
        self.inner.read(out)
    }
}

/// Reads the first bytes of `reader`, detects its encoding and returns a
/// reader positioned after the byte order mark.
///
/// # Errors
///
/// Propagates read failures.
pub fn sniff<R: Read>(mut reader: R) -> io::Result<(JsonEncoding, Prefixed<R>)> {
    let mut prefix = [0u8; 4];
    let mut len = 0;
    while len < prefix.len() {
        match reader.read(&mut prefix[len..]) {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    let (encoding, bom) = JsonEncoding::detect(&prefix[..len]);
    log::trace!("detected input encoding {encoding:?}");
    Ok((
        encoding,
        Prefixed {
            prefix,
            start: bom,
            end: len,
            inner: reader,
        },
    ))
}

fn invalid(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

const RAW_CHUNK: usize = 4096;

/// Small queue of UTF-8 bytes of one character not yet handed out.
#[derive(Debug, Default)]
struct Pending {
    bytes: [u8; 4],
    pos: usize,
    len: usize,
}

impl Pending {
    fn set(&mut self, c: char) {
        self.len = c.encode_utf8(&mut self.bytes).len();
        self.pos = 0;
    }

    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = (self.len - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn is_empty(&self) -> bool {
        self.pos == self.len
    }
}

/// Decodes UTF-16 or UTF-32 input into UTF-8.
///
/// Malformed input (unpaired surrogates, out of range code points, a
/// truncated final unit) fails with [`io::ErrorKind::InvalidData`].
#[derive(Debug)]
pub struct WideReader<R> {
    inner: R,
    encoding: JsonEncoding,
    raw: Vec<u8>,
    raw_pos: usize,
    pending: Pending,
    eof: bool,
}

impl<R: Read> WideReader<R> {
    #[must_use]
    pub fn new(inner: R, encoding: JsonEncoding) -> Self {
        debug_assert_ne!(encoding, JsonEncoding::Utf8);
        Self {
            inner,
            encoding,
            raw: Vec::with_capacity(RAW_CHUNK),
            raw_pos: 0,
            pending: Pending::default(),
            eof: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.raw.drain(..self.raw_pos);
        self.raw_pos = 0;
        let filled = self.raw.len();
        self.raw.resize(filled + RAW_CHUNK, 0);
        loop {
            match self.inner.read(&mut self.raw[filled..]) {
                Ok(n) => {
                    self.raw.truncate(filled + n);
                    self.eof = n == 0;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.raw.truncate(filled);
                    return Err(e);
                }
            }
        }
    }

    fn ensure(&mut self, n: usize, may_read: bool) -> io::Result<bool> {
        while self.raw.len() - self.raw_pos < n {
            if !may_read || self.eof {
                return Ok(false);
            }
            self.fill()?;
        }
        Ok(true)
    }

    fn unit_at(&self, offset: usize) -> u32 {
        let b = &self.raw[self.raw_pos + offset..];
        match self.encoding {
            JsonEncoding::Utf16Be => u32::from(u16::from_be_bytes([b[0], b[1]])),
            JsonEncoding::Utf16Le => u32::from(u16::from_le_bytes([b[0], b[1]])),
            JsonEncoding::Utf32Be => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            JsonEncoding::Utf32Le | JsonEncoding::Utf8 => {
                u32::from_le_bytes([b[0], b[1], b[2], b[3]])
            }
        }
    }

    /// Decodes the next character. Without `may_read`, only already buffered
    /// units are used.
    fn decode_char(&mut self, may_read: bool) -> io::Result<Option<char>> {
        let unit = self.encoding.unit_len();
        if !self.ensure(unit, may_read)? {
            if may_read && self.raw_pos < self.raw.len() {
                return Err(invalid("truncated code unit at end of input"));
            }
            return Ok(None);
        }
        let first = self.unit_at(0);
        let (code, consumed) = if unit == 2 && (0xD800..0xDC00).contains(&first) {
            if !self.ensure(2 * unit, may_read)? {
                if may_read {
                    return Err(invalid("unpaired high surrogate at end of input"));
                }
                return Ok(None);
            }
            let second = self.unit_at(unit);
            if !(0xDC00..0xE000).contains(&second) {
                return Err(invalid("high surrogate not followed by a low surrogate"));
            }
            (0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00), 2 * unit)
        } else {
            (first, unit)
        };
        let c = char::from_u32(code).ok_or_else(|| invalid("invalid code point"))?;
        self.raw_pos += consumed;
        Ok(Some(c))
    }
}

impl<R: Read> Read for WideReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < out.len() {
            if !self.pending.is_empty() {
                written += self.pending.drain_into(&mut out[written..]);
                continue;
            }
            match self.decode_char(written == 0)? {
                Some(c) => self.pending.set(c),
                None => break,
            }
        }
        Ok(written)
    }
}

/// Adapts a character iterator into UTF-8 bytes.
#[derive(Debug)]
pub struct CharsReader<I> {
    chars: I,
    pending: Pending,
}

impl<I: Iterator<Item = char>> CharsReader<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            pending: Pending::default(),
        }
    }
}

impl<I: Iterator<Item = char>> Read for CharsReader<I> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < out.len() {
            if !self.pending.is_empty() {
                written += self.pending.drain_into(&mut out[written..]);
                continue;
            }
            match self.chars.next() {
                Some(c) => self.pending.set(c),
                None => break,
            }
        }
        Ok(written)
    }
}

/// Byte input after encoding detection: UTF-8 passes through, wide
/// encodings are decoded.
#[derive(Debug)]
pub enum JsonReader<R> {
    Utf8(Prefixed<R>),
    Wide(WideReader<Prefixed<R>>),
}

impl<R: Read> JsonReader<R> {
    /// Reader for input known to be in `encoding`, after any byte order mark.
    pub fn with_encoding(reader: R, encoding: JsonEncoding) -> Self {
        let prefixed = Prefixed {
            prefix: [0; 4],
            start: 0,
            end: 0,
            inner: reader,
        };
        Self::from_prefixed(prefixed, encoding)
    }

    /// Detects the encoding of `reader`.
    ///
    /// # Errors
    ///
    /// Propagates read failures.
    pub fn detect(reader: R) -> io::Result<(JsonEncoding, Self)> {
        let (encoding, prefixed) = sniff(reader)?;
        Ok((encoding, Self::from_prefixed(prefixed, encoding)))
    }

    fn from_prefixed(prefixed: Prefixed<R>, encoding: JsonEncoding) -> Self {
        match encoding {
            JsonEncoding::Utf8 => Self::Utf8(prefixed),
            wide => Self::Wide(WideReader::new(prefixed, wide)),
        }
    }
}

impl<R: Read> Read for JsonReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Utf8(r) => r.read(out),
            Self::Wide(r) => r.read(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str, encoding: JsonEncoding) -> Vec<u8> {
        match encoding {
            JsonEncoding::Utf8 => text.as_bytes().to_vec(),
            JsonEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            JsonEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            JsonEncoding::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
            JsonEncoding::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
        }
    }

    fn read_all(reader: impl Read) -> io::Result<String> {
        let mut out = String::new();
        let mut reader = reader;
        reader.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn detects_by_zero_pattern() {
        let text = "{\"a\":\"\u{1F603}\"}";
        for encoding in [
            JsonEncoding::Utf8,
            JsonEncoding::Utf16Be,
            JsonEncoding::Utf16Le,
            JsonEncoding::Utf32Be,
            JsonEncoding::Utf32Le,
        ] {
            let bytes = encode(text, encoding);
            let (found, reader) = JsonReader::detect(&bytes[..]).unwrap();
            assert_eq!(found, encoding);
            assert_eq!(read_all(reader).unwrap(), text);
        }
    }

    #[test]
    fn skips_byte_order_marks() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(encode("[1]", JsonEncoding::Utf16Le));
        let (found, reader) = JsonReader::detect(&bytes[..]).unwrap();
        assert_eq!(found, JsonEncoding::Utf16Le);
        assert_eq!(read_all(reader).unwrap(), "[1]");

        let bytes = b"\xEF\xBB\xBF[]";
        let (found, reader) = JsonReader::detect(&bytes[..]).unwrap();
        assert_eq!(found, JsonEncoding::Utf8);
        assert_eq!(read_all(reader).unwrap(), "[]");
    }

    #[test]
    fn short_input_is_utf8() {
        assert_eq!(JsonEncoding::detect(b"1"), (JsonEncoding::Utf8, 0));
        assert_eq!(JsonEncoding::detect(b""), (JsonEncoding::Utf8, 0));
    }

    #[test]
    fn unpaired_surrogate_is_invalid_data() {
        let bytes = [0xD8, 0x3D, 0x00, 0x41];
        let reader = WideReader::new(&bytes[..], JsonEncoding::Utf16Be);
        let err = read_all(reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn chars_reader_encodes() {
        let reader = CharsReader::new("é\u{1F603}".chars());
        assert_eq!(read_all(reader).unwrap(), "é\u{1F603}");
    }
}
