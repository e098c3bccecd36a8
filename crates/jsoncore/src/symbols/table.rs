//! Bucket storage and root/child lineage shared by both canonicalizers.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{
    bucket_index, CollisionLimitError, TableStats, DEFAULT_TABLE_SIZE,
    MAX_COLL_CHAIN_LENGTH, MAX_ENTRIES_FOR_REUSE, MAX_TABLE_SIZE,
};

/// What a canonicalizer stores per name.
pub(crate) trait SymbolEntry: Clone {
    fn hash(&self) -> u32;
}

/// Open hashing with one primary slot per bucket and an overflow chain.
///
/// The overflow chain of a bucket is its collision chain: its length is what
/// [`MAX_COLL_CHAIN_LENGTH`] bounds.
#[derive(Debug, Clone)]
pub(crate) struct BucketTable<S> {
    primary: Vec<Option<S>>,
    spill: Vec<Vec<S>>,
    size: usize,
    collision_count: usize,
    longest_collision: usize,
}

impl<S: SymbolEntry> BucketTable<S> {
    pub(crate) fn with_buckets(bucket_count: usize) -> Self {
        debug_assert!(bucket_count.is_power_of_two());
        Self {
            primary: vec![None; bucket_count],
            spill: vec![Vec::new(); bucket_count],
            size: 0,
            collision_count: 0,
            longest_collision: 0,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.primary.len()
    }

    pub(crate) fn stats(&self) -> TableStats {
        TableStats {
            size: self.size,
            bucket_count: self.bucket_count(),
            collision_count: self.collision_count,
            max_collision_length: self.longest_collision,
        }
    }

    pub(crate) fn find(&self, hash: u32, mut matches: impl FnMut(&S) -> bool) -> Option<&S> {
        let index = bucket_index(hash, self.bucket_count());
        let head = self.primary[index].as_ref()?;
        if head.hash() == hash && matches(head) {
            return Some(head);
        }
        self.spill[index]
            .iter()
            .find(|entry| entry.hash() == hash && matches(entry))
    }

    /// Adds an entry known to be absent.
    pub(crate) fn insert(&mut self, entry: S) -> Result<(), CollisionLimitError> {
        if self.size >= self.bucket_count() - (self.bucket_count() >> 2) {
            self.grow();
        }
        let index = bucket_index(entry.hash(), self.bucket_count());
        if self.primary[index].is_none() {
            self.primary[index] = Some(entry);
        } else {
            let chain = &mut self.spill[index];
            if chain.len() >= MAX_COLL_CHAIN_LENGTH {
                log::warn!(
                    "symbol table collision chain limit reached with {} names",
                    self.size
                );
                return Err(CollisionLimitError {
                    size: self.size,
                    limit: MAX_COLL_CHAIN_LENGTH,
                });
            }
            chain.push(entry);
            self.collision_count += 1;
            self.longest_collision = self.longest_collision.max(chain.len());
        }
        self.size += 1;
        Ok(())
    }

    fn grow(&mut self) {
        let new_count = self.bucket_count() * 2;
        if new_count > MAX_TABLE_SIZE {
            log::debug!(
                "symbol table reached {} names, clearing instead of growing",
                self.size
            );
            *self = Self::with_buckets(DEFAULT_TABLE_SIZE);
            return;
        }
        log::trace!("symbol table growing to {new_count} buckets");
        let old_primary = core::mem::take(&mut self.primary);
        let old_spill = core::mem::take(&mut self.spill);
        *self = Self::with_buckets(new_count);
        for entry in old_primary
            .into_iter()
            .flatten()
            .chain(old_spill.into_iter().flatten())
        {
            self.place(entry);
        }
    }

    /// Rehash placement. Doubling only splits chains, so the limit cannot be
    /// hit here.
    fn place(&mut self, entry: S) {
        let index = bucket_index(entry.hash(), self.bucket_count());
        if self.primary[index].is_none() {
            self.primary[index] = Some(entry);
        } else {
            let chain = &mut self.spill[index];
            chain.push(entry);
            self.collision_count += 1;
            self.longest_collision = self.longest_collision.max(chain.len());
        }
        self.size += 1;
    }
}

#[derive(Debug)]
struct RootState<S> {
    table: Arc<BucketTable<S>>,
    version: u64,
}

/// Shared snapshot that children are derived from and merge back into.
#[derive(Debug)]
pub(crate) struct RootTable<S> {
    seed: u32,
    state: RwLock<RootState<S>>,
}

impl<S: SymbolEntry> RootTable<S> {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            seed,
            state: RwLock::new(RootState {
                table: Arc::new(BucketTable::with_buckets(DEFAULT_TABLE_SIZE)),
                version: 0,
            }),
        }
    }

    pub(crate) fn seed(&self) -> u32 {
        self.seed
    }

    pub(crate) fn version(&self) -> u64 {
        self.state.read().version
    }

    pub(crate) fn stats(&self) -> TableStats {
        self.state.read().table.stats()
    }

    pub(crate) fn snapshot(&self) -> Arc<BucketTable<S>> {
        self.state.read().table.clone()
    }

    pub(crate) fn make_child(self: &Arc<Self>) -> ChildTable<S> {
        let (table, base_version) = {
            let state = self.state.read();
            (state.table.clone(), state.version)
        };
        ChildTable {
            root: self.clone(),
            base_version,
            table,
            added: 0,
            poisoned: None,
            released: false,
        }
    }

    /// Installs `table` if nothing merged since `base_version`.
    fn merge(&self, base_version: u64, table: &Arc<BucketTable<S>>) -> bool {
        let mut state = self.state.write();
        if state.version != base_version {
            log::debug!(
                "symbol table merge lost: root moved from version {base_version} to {}",
                state.version
            );
            return false;
        }
        if table.size() > MAX_ENTRIES_FOR_REUSE {
            log::debug!(
                "child symbol table too big to reuse ({} names), resetting root",
                table.size()
            );
            state.table = Arc::new(BucketTable::with_buckets(DEFAULT_TABLE_SIZE));
        } else {
            state.table = table.clone();
        }
        state.version += 1;
        true
    }
}

/// Per-operation view of a root. Lookups hit the shared snapshot; the first
/// insertion copies it.
#[derive(Debug)]
pub(crate) struct ChildTable<S: SymbolEntry> {
    root: Arc<RootTable<S>>,
    base_version: u64,
    table: Arc<BucketTable<S>>,
    added: usize,
    poisoned: Option<CollisionLimitError>,
    released: bool,
}

impl<S: SymbolEntry> ChildTable<S> {
    pub(crate) fn seed(&self) -> u32 {
        self.root.seed()
    }

    pub(crate) fn table(&self) -> &BucketTable<S> {
        &self.table
    }

    pub(crate) fn added(&self) -> usize {
        self.added
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    pub(crate) fn insert(&mut self, entry: S) -> Result<(), CollisionLimitError> {
        if let Some(err) = self.poisoned {
            return Err(err);
        }
        match Arc::make_mut(&mut self.table).insert(entry) {
            Ok(()) => {
                self.added += 1;
                Ok(())
            }
            Err(err) => {
                self.poisoned = Some(err);
                Err(err)
            }
        }
    }

    /// Offers the additions to the root, at most once. Returns whether the
    /// root adopted them.
    pub(crate) fn release(&mut self) -> bool {
        if core::mem::replace(&mut self.released, true) {
            return false;
        }
        if self.added == 0 || self.poisoned.is_some() {
            return false;
        }
        self.root.merge(self.base_version, &self.table)
    }
}

impl<S: SymbolEntry> Drop for ChildTable<S> {
    fn drop(&mut self) {
        self.release();
    }
}
