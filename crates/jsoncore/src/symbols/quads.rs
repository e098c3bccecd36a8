use std::sync::Arc;

use super::{
    table::{ChildTable, RootTable, SymbolEntry},
    CollisionLimitError, Name, Seed, TableStats, HASH_MULT,
};

#[derive(Debug, Clone)]
pub(crate) struct QuadEntry {
    hash: u32,
    quads: Box<[u32]>,
    byte_len: usize,
    name: Name,
}

impl QuadEntry {
    fn matches(&self, bytes: &[u8]) -> bool {
        self.byte_len == bytes.len() && self.quads.iter().copied().eq(quads(bytes))
    }
}

impl SymbolEntry for QuadEntry {
    fn hash(&self) -> u32 {
        self.hash
    }
}

/// Packs bytes into big-endian 32-bit groups; a short final group is right
/// aligned.
pub(crate) fn quads(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0u32, |q, &b| (q << 8) | u32::from(b)))
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn hash_quads(seed: u32, bytes: &[u8]) -> u32 {
    let hash = quads(bytes).fold(seed ^ bytes.len() as u32, |h, q| {
        h.wrapping_mul(HASH_MULT).wrapping_add(q)
    });
    if hash == 0 { 1 } else { hash }
}

/// Root table for names read from UTF-8 byte input.
///
/// Cloning shares the root.
#[derive(Debug, Clone)]
pub struct ByteQuadsCanonicalizer {
    root: Arc<RootTable<QuadEntry>>,
}

impl Default for ByteQuadsCanonicalizer {
    fn default() -> Self {
        Self::new(Seed::default())
    }
}

impl ByteQuadsCanonicalizer {
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self {
            root: Arc::new(RootTable::new(seed.resolve())),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u32 {
        self.root.seed()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.root.version()
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        self.root.stats()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let bytes = name.as_bytes();
        let hash = hash_quads(self.root.seed(), bytes);
        self.root
            .snapshot()
            .find(hash, |e| e.matches(bytes))
            .is_some()
    }

    #[must_use]
    pub fn make_child(&self) -> QuadSymbols {
        QuadSymbols {
            table: self.root.make_child(),
        }
    }
}

/// Child table used by one byte-input parser.
#[derive(Debug)]
pub struct QuadSymbols {
    table: ChildTable<QuadEntry>,
}

impl QuadSymbols {
    /// Looks `bytes` up without decoding them.
    #[must_use]
    pub fn find(&self, bytes: &[u8]) -> Option<Name> {
        let hash = hash_quads(self.table.seed(), bytes);
        self.table
            .table()
            .find(hash, |e| e.matches(bytes))
            .map(|e| e.name.clone())
    }

    /// Adds a name known to be absent. `bytes` is the UTF-8 form of `text`.
    ///
    /// # Errors
    ///
    /// Fails when the name would extend a collision chain past the limit, and
    /// on every call after that.
    pub fn add(&mut self, bytes: &[u8], text: &str) -> Result<Name, CollisionLimitError> {
        debug_assert_eq!(bytes, text.as_bytes());
        let entry = QuadEntry {
            hash: hash_quads(self.table.seed(), bytes),
            quads: quads(bytes).collect(),
            byte_len: bytes.len(),
            name: Name::new(text),
        };
        let interned = entry.name.clone();
        self.table.insert(entry)?;
        Ok(interned)
    }

    /// [`find`](Self::find), then [`add`](Self::add) on a miss.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn intern(&mut self, bytes: &[u8], text: &str) -> Result<Name, CollisionLimitError> {
        match self.find(bytes) {
            Some(name) => Ok(name),
            None => self.add(bytes, text),
        }
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        self.table.table().stats()
    }

    #[must_use]
    pub fn added(&self) -> usize {
        self.table.added()
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.table.is_poisoned()
    }

    /// Merges into the root now instead of on drop.
    pub fn release(&mut self) -> bool {
        self.table.release()
    }
}
