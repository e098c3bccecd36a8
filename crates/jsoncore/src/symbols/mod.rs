//! Field-name canonicalization.
//!
//! Repeated field names are interned so that every occurrence of the same
//! text within one table lineage yields the same shared allocation. Two
//! tables exist: [`CharsToNameCanonicalizer`] hashes decoded characters and
//! serves character-based input, [`ByteQuadsCanonicalizer`] hashes raw UTF-8
//! bytes packed into 32-bit quads and serves byte input without decoding
//! names that are already known.
//!
//! Each canonicalizer is a *root*: a shared snapshot that parsers never
//! mutate directly. A parser works on a *child* derived from the root and
//! offers its additions back when it finishes. Only the first child to merge
//! after a given snapshot wins; the others discard their additions.

mod chars;
mod quads;
mod table;

use core::{borrow::Borrow, fmt, hash::Hash, ops::Deref};
use std::sync::Arc;

use thiserror::Error;

pub use chars::{CharsSymbols, CharsToNameCanonicalizer};
pub use quads::{ByteQuadsCanonicalizer, QuadSymbols};

/// Longest collision chain a bucket may hold.
pub const MAX_COLL_CHAIN_LENGTH: usize = 100;

/// Initial bucket count of a fresh root table.
pub const DEFAULT_TABLE_SIZE: usize = 64;

/// Bucket count past which a table is cleared instead of doubled.
pub const MAX_TABLE_SIZE: usize = 0x10000;

/// Children holding more names than this are not merged back; the root is
/// reset to an empty table instead.
pub const MAX_ENTRIES_FOR_REUSE: usize = 12_000;

pub(crate) const HASH_MULT: u32 = 33;

/// An interned field name.
///
/// Equality, ordering and hashing follow the text. Two names coming out of
/// the same table lineage can also be compared by identity with
/// [`Name::ptr_eq`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    /// Creates a name that does not belong to any table.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(Arc::from(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both names share one allocation.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Hash seed of a root table and every child derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Seed {
    /// Reproducible hashing, for tests.
    Fixed(u32),
    /// Drawn once per root from the thread-local generator.
    #[default]
    Random,
}

impl Seed {
    pub(crate) fn resolve(self) -> u32 {
        match self {
            Self::Fixed(seed) => seed,
            Self::Random => rand::random(),
        }
    }
}

/// Snapshot of a table's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    /// Interned names.
    pub size: usize,
    pub bucket_count: usize,
    /// Insertions that landed in an occupied bucket.
    pub collision_count: usize,
    /// Longest overflow chain of any bucket.
    pub max_collision_length: usize,
}

/// A bucket's collision chain would have exceeded
/// [`MAX_COLL_CHAIN_LENGTH`].
///
/// This almost certainly means the input was crafted to collide. The table
/// that raised it refuses every later insertion.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error(
    "longest collision chain in symbol table (of size {size}) now exceeds maximum, {limit}: \
     suspect a denial-of-service attack based on hash collisions"
)]
pub struct CollisionLimitError {
    pub size: usize,
    pub limit: usize,
}

/// Per-parser name interning, whichever table backs it.
#[derive(Debug)]
pub(crate) enum Interner {
    Chars(CharsSymbols),
    Quads(QuadSymbols),
    /// Names are copied, not interned.
    Disabled,
}

impl Interner {
    /// `name` is text the parser has already decoded.
    pub(crate) fn intern(&mut self, name: &str) -> Result<Name, CollisionLimitError> {
        match self {
            Self::Chars(table) => table.intern(name),
            Self::Quads(table) => table.intern(name.as_bytes(), name),
            Self::Disabled => Ok(Name::new(name)),
        }
    }

    /// Offers the child's additions back to its root.
    pub(crate) fn release(&mut self) {
        match self {
            Self::Chars(table) => {
                table.release();
            }
            Self::Quads(table) => {
                table.release();
            }
            Self::Disabled => {}
        }
    }
}

/// Spreads the raw hash over the low bits used for bucket selection.
pub(crate) fn bucket_index(hash: u32, bucket_count: usize) -> usize {
    let mut h = hash;
    h = h.wrapping_add(h >> 15);
    h ^= h << 7;
    h = h.wrapping_add(h >> 3);
    (h as usize) & (bucket_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_compares_by_text_and_identity() {
        let a = Name::new("field");
        let b = Name::new("field");
        assert_eq!(a, b);
        assert!(!Name::ptr_eq(&a, &b));
        assert!(Name::ptr_eq(&a, &a.clone()));
        assert_eq!(a, "field");
        assert_eq!(format!("{a:?}"), "\"field\"");
    }

    #[test]
    fn disabled_interner_copies() {
        let mut interner = Interner::Disabled;
        let a = interner.intern("x").unwrap();
        let b = interner.intern("x").unwrap();
        assert_eq!(a, b);
        assert!(!Name::ptr_eq(&a, &b));
    }

    #[test]
    fn collision_message_names_the_attack() {
        let err = CollisionLimitError {
            size: 101,
            limit: MAX_COLL_CHAIN_LENGTH,
        };
        assert!(err.to_string().contains("exceeds maximum, 100"));
    }
}
