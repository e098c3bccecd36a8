//! Scratch buffer pool shared across parse and generate operations.
//!
//! Buffers are checked out through an [`IoContext`] as [`Recycled`] guards
//! and return to the pool when the guard drops, on every exit path. Contents
//! are never zeroed; only the length is reset.

use core::{
    fmt,
    ops::{Deref, DerefMut},
};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Purpose classes for byte buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteBufferKind {
    /// Input buffering for parsers.
    ReadIo,
    /// Output buffering for generators.
    WriteEncoding,
    /// Scratch for assembling multi-part binary payloads.
    WriteConcat,
    /// Decoded binary values.
    Base64Codec,
}

impl ByteBufferKind {
    const COUNT: usize = 4;

    const fn index(self) -> usize {
        match self {
            Self::ReadIo => 0,
            Self::WriteEncoding => 1,
            Self::WriteConcat => 2,
            Self::Base64Codec => 3,
        }
    }

    #[must_use]
    pub const fn default_size(self) -> usize {
        match self {
            Self::ReadIo | Self::WriteEncoding => 8000,
            Self::WriteConcat | Self::Base64Codec => 2000,
        }
    }
}

/// Purpose classes for text buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharBufferKind {
    /// Decoded string and number tokens.
    TokenBuffer,
    /// Concatenation of long values.
    ConcatBuffer,
    /// Short-lived text fragments.
    TextBuffer,
    /// Field names that could not be interned straight from input.
    NameCopy,
}

impl CharBufferKind {
    const COUNT: usize = 4;

    const fn index(self) -> usize {
        match self {
            Self::TokenBuffer => 0,
            Self::ConcatBuffer => 1,
            Self::TextBuffer => 2,
            Self::NameCopy => 3,
        }
    }

    #[must_use]
    pub const fn default_size(self) -> usize {
        match self {
            Self::TokenBuffer | Self::ConcatBuffer => 2000,
            Self::TextBuffer | Self::NameCopy => 200,
        }
    }
}

const DEFAULT_MAX_POOLED: usize = 16;

/// Pool of reusable byte and text buffers, one free list per purpose class.
pub struct BufferRecycler {
    bytes: [Mutex<Vec<Vec<u8>>>; ByteBufferKind::COUNT],
    chars: [Mutex<Vec<String>>; CharBufferKind::COUNT],
    max_pooled: usize,
}

impl fmt::Debug for BufferRecycler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRecycler")
            .field("max_pooled", &self.max_pooled)
            .finish_non_exhaustive()
    }
}

impl Default for BufferRecycler {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferRecycler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_pooled(DEFAULT_MAX_POOLED)
    }

    /// Keeps at most `max_pooled` idle buffers per purpose class.
    #[must_use]
    pub fn with_max_pooled(max_pooled: usize) -> Self {
        Self {
            bytes: Default::default(),
            chars: Default::default(),
            max_pooled,
        }
    }

    /// Process-wide default pool, created on first use.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<BufferRecycler>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Returns an empty buffer with capacity for at least `min_len` bytes,
    /// reusing a pooled one when available.
    pub fn acquire_bytes(&self, kind: ByteBufferKind, min_len: usize) -> Vec<u8> {
        let wanted = min_len.max(kind.default_size());
        let pooled = self.bytes[kind.index()].lock().pop();
        match pooled {
            Some(mut buf) => {
                buf.clear();
                buf.reserve(wanted);
                buf
            }
            None => {
                log::trace!("buffer pool miss for {kind:?}");
                Vec::with_capacity(wanted)
            }
        }
    }

    pub fn release_bytes(&self, kind: ByteBufferKind, buf: Vec<u8>) {
        let mut pool = self.bytes[kind.index()].lock();
        if pool.len() < self.max_pooled {
            pool.push(buf);
        }
    }

    /// Returns an empty string with capacity for at least `min_len` bytes,
    /// reusing a pooled one when available.
    pub fn acquire_chars(&self, kind: CharBufferKind, min_len: usize) -> String {
        let wanted = min_len.max(kind.default_size());
        let pooled = self.chars[kind.index()].lock().pop();
        match pooled {
            Some(mut buf) => {
                buf.clear();
                buf.reserve(wanted);
                buf
            }
            None => {
                log::trace!("buffer pool miss for {kind:?}");
                String::with_capacity(wanted)
            }
        }
    }

    pub fn release_chars(&self, kind: CharBufferKind, buf: String) {
        let mut pool = self.chars[kind.index()].lock();
        if pool.len() < self.max_pooled {
            pool.push(buf);
        }
    }

    /// Idle byte buffers currently pooled for `kind`.
    #[must_use]
    pub fn pooled_bytes(&self, kind: ByteBufferKind) -> usize {
        self.bytes[kind.index()].lock().len()
    }

    /// Idle text buffers currently pooled for `kind`.
    #[must_use]
    pub fn pooled_chars(&self, kind: CharBufferKind) -> usize {
        self.chars[kind.index()].lock().len()
    }
}

/// A buffer type the recycler knows how to pool.
pub trait Recyclable: Default {
    type Kind: Copy + fmt::Debug;

    fn acquire(recycler: &BufferRecycler, kind: Self::Kind, min_len: usize) -> Self;
    fn release(recycler: &BufferRecycler, kind: Self::Kind, value: Self);
}

impl Recyclable for Vec<u8> {
    type Kind = ByteBufferKind;

    fn acquire(recycler: &BufferRecycler, kind: Self::Kind, min_len: usize) -> Self {
        recycler.acquire_bytes(kind, min_len)
    }

    fn release(recycler: &BufferRecycler, kind: Self::Kind, value: Self) {
        recycler.release_bytes(kind, value);
    }
}

impl Recyclable for String {
    type Kind = CharBufferKind;

    fn acquire(recycler: &BufferRecycler, kind: Self::Kind, min_len: usize) -> Self {
        recycler.acquire_chars(kind, min_len)
    }

    fn release(recycler: &BufferRecycler, kind: Self::Kind, value: Self) {
        recycler.release_chars(kind, value);
    }
}

/// A checked-out buffer; returns itself to the pool on drop.
pub struct Recycled<T: Recyclable> {
    value: T,
    kind: T::Kind,
    recycler: Arc<BufferRecycler>,
}

impl<T: Recyclable> Recycled<T> {
    #[must_use]
    pub fn kind(&self) -> T::Kind {
        self.kind
    }
}

impl<T: Recyclable> Deref for Recycled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recyclable> DerefMut for Recycled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recyclable + fmt::Debug> fmt::Debug for Recycled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recycled")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: Recyclable> Drop for Recycled<T> {
    fn drop(&mut self) {
        let value = core::mem::take(&mut self.value);
        T::release(&self.recycler, self.kind, value);
    }
}

/// Per-operation scope over a [`BufferRecycler`].
///
/// Every parser and generator owns one; the buffers it hands out go back to
/// the pool when they (and therefore their owner) are dropped.
#[derive(Debug, Clone)]
pub struct IoContext {
    recycler: Arc<BufferRecycler>,
}

impl Default for IoContext {
    fn default() -> Self {
        Self::new(BufferRecycler::global())
    }
}

impl IoContext {
    #[must_use]
    pub fn new(recycler: Arc<BufferRecycler>) -> Self {
        Self { recycler }
    }

    #[must_use]
    pub fn recycler(&self) -> &Arc<BufferRecycler> {
        &self.recycler
    }

    #[must_use]
    pub fn acquire<T: Recyclable>(&self, kind: T::Kind, min_len: usize) -> Recycled<T> {
        Recycled {
            value: T::acquire(&self.recycler, kind, min_len),
            kind,
            recycler: self.recycler.clone(),
        }
    }

    #[must_use]
    pub fn read_io_buffer(&self) -> Recycled<Vec<u8>> {
        self.acquire(ByteBufferKind::ReadIo, 0)
    }

    #[must_use]
    pub fn write_encoding_buffer(&self) -> Recycled<Vec<u8>> {
        self.acquire(ByteBufferKind::WriteEncoding, 0)
    }

    #[must_use]
    pub fn base64_buffer(&self) -> Recycled<Vec<u8>> {
        self.acquire(ByteBufferKind::Base64Codec, 0)
    }

    #[must_use]
    pub fn token_buffer(&self) -> Recycled<String> {
        self.acquire(CharBufferKind::TokenBuffer, 0)
    }

    #[must_use]
    pub fn name_copy_buffer(&self) -> Recycled<String> {
        self.acquire(CharBufferKind::NameCopy, 0)
    }
}
