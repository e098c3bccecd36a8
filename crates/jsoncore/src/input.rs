//! Refillable byte window over a blocking reader.
//!
//! Both parsers read through this. The window keeps the unconsumed tail when
//! it refills, so a multi-byte sequence cut by the end of one read is still
//! whole after [`ByteInput::ensure`] returns.

use std::io::{self, Read};

use crate::{error::Location, recycler::Recycled};

const MIN_READ: usize = 512;

pub(crate) struct ByteInput<R> {
    reader: R,
    /// Sized once up front; only `buf[..end]` holds input.
    buf: Recycled<Vec<u8>>,
    pos: usize,
    end: usize,
    /// Absolute offset of `buf[0]`.
    origin: u64,
    line: usize,
    line_start: u64,
    eof: bool,
}

impl<R: Read> ByteInput<R> {
    pub(crate) fn new(reader: R, mut buf: Recycled<Vec<u8>>) -> Self {
        let window = buf.capacity().max(MIN_READ);
        buf.clear();
        buf.resize(window, 0);
        Self {
            reader,
            buf,
            pos: 0,
            end: 0,
            origin: 0,
            line: 1,
            line_start: 0,
            eof: false,
        }
    }

    /// Reads more input, keeping unconsumed bytes. Returns `false` at end of
    /// input.
    pub(crate) fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.origin += self.pos as u64;
            self.end -= self.pos;
            self.pos = 0;
        }
        if self.end == self.buf.len() {
            let grown = self.buf.len() * 2;
            self.buf.resize(grown, 0);
        }
        loop {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Makes at least `n` bytes available. Returns `false` if input ends
    /// first.
    pub(crate) fn ensure(&mut self, n: usize) -> io::Result<bool> {
        while self.end - self.pos < n {
            if !self.fill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.pos == self.end && !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    pub(crate) fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    /// Consumes one byte that [`peek`](Self::peek) returned.
    pub(crate) fn bump(&mut self) {
        debug_assert!(self.pos < self.end);
        self.pos += 1;
    }

    /// Unconsumed buffered bytes.
    pub(crate) fn available(&self) -> &[u8] {
        &self.buf[self.pos..self.end]
    }

    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.end);
        self.pos += n;
    }

    /// Returns the next `n` bytes and consumes them, or `None` if input ends
    /// first.
    pub(crate) fn take(&mut self, n: usize) -> io::Result<Option<&[u8]>> {
        if !self.ensure(n)? {
            return Ok(None);
        }
        let start = self.pos;
        self.pos += n;
        Ok(Some(&self.buf[start..start + n]))
    }

    /// Records that the byte just consumed ended a line.
    pub(crate) fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.offset();
    }

    pub(crate) fn offset(&self) -> u64 {
        self.origin + self.pos as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn location(&self) -> Location {
        let offset = self.offset();
        Location {
            byte_offset: offset,
            line: self.line,
            column: (offset - self.line_start) as usize + 1,
        }
    }
}
