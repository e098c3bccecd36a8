use std::sync::Arc;

use super::{
    table::{ChildTable, RootTable, SymbolEntry},
    CollisionLimitError, Name, Seed, TableStats, HASH_MULT,
};

#[derive(Debug, Clone)]
pub(crate) struct CharEntry {
    hash: u32,
    name: Name,
}

impl SymbolEntry for CharEntry {
    fn hash(&self) -> u32 {
        self.hash
    }
}

/// Multiplicative hash over code points. Zero is reserved.
pub(crate) fn hash_chars(seed: u32, text: &str) -> u32 {
    let hash = text.chars().fold(seed, |h, c| {
        h.wrapping_mul(HASH_MULT).wrapping_add(u32::from(c))
    });
    if hash == 0 { 1 } else { hash }
}

/// Root table for names read from character input.
///
/// Cloning shares the root.
#[derive(Debug, Clone)]
pub struct CharsToNameCanonicalizer {
    root: Arc<RootTable<CharEntry>>,
}

impl Default for CharsToNameCanonicalizer {
    fn default() -> Self {
        Self::new(Seed::default())
    }
}

impl CharsToNameCanonicalizer {
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

    /// Bumped by every successful merge.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.root.version()
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        self.root.stats()
    }

    /// Whether the current snapshot holds `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let hash = hash_chars(self.root.seed(), name);
        self.root
            .snapshot()
            .find(hash, |e| *e.name == *name)
            .is_some()
    }

    /// Derives a table for one parse operation.
    #[must_use]
    pub fn make_child(&self) -> CharsSymbols {
        CharsSymbols {
            table: self.root.make_child(),
        }
    }
}

/// Child table used by one parser.
#[derive(Debug)]
pub struct CharsSymbols {
    table: ChildTable<CharEntry>,
}

impl CharsSymbols {
    /// Returns the canonical instance of `name`, adding it when new.
    ///
    /// # Errors
    ///
    /// Fails when the name would extend a collision chain past the limit, and
    /// on every call after that.
    pub fn intern(&mut self, name: &str) -> Result<Name, CollisionLimitError> {
        let hash = hash_chars(self.table.seed(), name);
        if let Some(found) = self.table.table().find(hash, |e| *e.name == *name) {
            return Ok(found.name.clone());
        }
        let entry = CharEntry {
            hash,
            name: Name::new(name),
        };
        let interned = entry.name.clone();
        self.table.insert(entry)?;
        Ok(interned)
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        self.table.table().stats()
    }

    /// Names added since this child was derived.
    #[must_use]
    pub fn added(&self) -> usize {
        self.table.added()
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.table.is_poisoned()
    }

    /// Merges into the root now instead of on drop. Returns whether the root
    /// adopted this child's names.
    pub fn release(&mut self) -> bool {
        self.table.release()
    }
}
