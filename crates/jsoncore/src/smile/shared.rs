//! Shared-string back-reference tables.
//!
//! The encoder remembers which strings it has written in full and at which
//! index; the decoder keeps the same strings in arrival order. Both sides
//! add exactly one entry per full short string and apply the same overflow
//! policy, so indices stay in lockstep.

use std::collections::HashMap;

use super::options::SharedOverflow;

/// Capacity of each shared table.
pub const MAX_SHARED_STRINGS: usize = 1024;

/// Longest value (in UTF-8 bytes) that can be shared: anything longer is
/// written with a long-string opcode, which is never shared.
pub const MAX_SHARED_VALUE_BYTES: usize = 65;

/// Back-reference indices whose low byte is `0xFE` or `0xFF` would put a
/// reserved byte on the wire, so those entries are never referenced.
pub(crate) fn is_valid_backref(index: usize) -> bool {
    index & 0xFF < 0xFE
}

/// Encoder side: text to most recent index.
#[derive(Debug)]
pub(crate) struct SeenStrings {
    index: HashMap<Box<str>, usize>,
    count: usize,
    overflow: SharedOverflow,
    disabled: bool,
    kind: &'static str,
}

impl SeenStrings {
    pub(crate) fn new(kind: &'static str, overflow: SharedOverflow) -> Self {
        Self {
            index: HashMap::new(),
            count: 0,
            overflow,
            disabled: false,
            kind,
        }
    }

    pub(crate) fn find(&self, text: &str) -> Option<usize> {
        self.index
            .get(text)
            .copied()
            .filter(|&ix| is_valid_backref(ix))
    }

    pub(crate) fn add(&mut self, text: &str) {
        if self.disabled {
            return;
        }
        if self.count == MAX_SHARED_STRINGS {
            match self.overflow {
                SharedOverflow::Reset => {
                    log::debug!("shared {} table full, resetting", self.kind);
                    self.index.clear();
                    self.count = 0;
                }
                SharedOverflow::Disable => {
                    log::debug!("shared {} table full, sharing disabled", self.kind);
                    self.disabled = true;
                    return;
                }
            }
        }
        self.index.insert(text.into(), self.count);
        self.count += 1;
    }
}

/// Decoder side: entries in arrival order.
#[derive(Debug)]
pub(crate) struct SharedStrings<T> {
    entries: Vec<T>,
    overflow: SharedOverflow,
    disabled: bool,
    kind: &'static str,
}

impl<T: Clone> SharedStrings<T> {
    pub(crate) fn new(kind: &'static str, overflow: SharedOverflow) -> Self {
        Self {
            entries: Vec::new(),
            overflow,
            disabled: false,
            kind,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        self.kind
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub(crate) fn add(&mut self, value: T) {
        if self.disabled {
            return;
        }
        if self.entries.len() == MAX_SHARED_STRINGS {
            match self.overflow {
                SharedOverflow::Reset => {
                    log::debug!("shared {} table full, resetting", self.kind);
                    self.entries.clear();
                }
                SharedOverflow::Disable => {
                    log::debug!("shared {} table full, sharing disabled", self.kind);
                    self.disabled = true;
                    return;
                }
            }
        }
        self.entries.push(value);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.disabled = false;
    }
}
