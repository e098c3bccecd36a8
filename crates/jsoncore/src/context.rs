//! Context frames for open containers.
//!
//! Frames live in a vector indexed by nesting depth; index 0 is the root.
//! Popping only moves the depth cursor, so slots are reused by the next push
//! and a warmed-up stack does not allocate.

use crate::{error::StructureError, symbols::Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Root,
    Array,
    Object,
}

impl ContextKind {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Array => "an array",
            Self::Object => "an object",
        }
    }
}

/// One open container.
#[derive(Debug, Clone)]
pub struct Frame {
    kind: ContextKind,
    /// Entries seen so far. Objects count field names, arrays and the root
    /// count values.
    entries: usize,
    name: Option<Name>,
    /// Object frames only: a name has been read or written and its value has
    /// not been seen yet.
    expects_value: bool,
}

impl Frame {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            entries: 0,
            name: None,
            expects_value: false,
        }
    }

    fn reset(&mut self, kind: ContextKind) {
        self.kind = kind;
        self.entries = 0;
        self.name = None;
        self.expects_value = false;
    }

    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub fn in_object(&self) -> bool {
        self.kind == ContextKind::Object
    }

    #[must_use]
    pub fn in_array(&self) -> bool {
        self.kind == ContextKind::Array
    }

    #[must_use]
    pub fn in_root(&self) -> bool {
        self.kind == ContextKind::Root
    }

    /// Most recent field name of an object frame.
    #[must_use]
    pub fn name(&self) -> Option<&Name> {
        self.name.as_ref()
    }

    #[must_use]
    pub fn expects_value(&self) -> bool {
        self.expects_value
    }

    /// Records a field name (object frames).
    pub(crate) fn set_name(&mut self, name: Name) {
        self.entries += 1;
        self.name = Some(name);
        self.expects_value = true;
    }

    /// Records a value: consumes the pending name in objects, counts the
    /// entry elsewhere.
    pub(crate) fn note_value(&mut self) {
        if self.kind == ContextKind::Object {
            self.expects_value = false;
        } else {
            self.entries += 1;
        }
    }
}

/// How a generator must separate the token it is about to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    AsIs,
    AfterComma,
    AfterRootValue,
}

#[derive(Debug, Clone)]
pub struct ContextStack {
    frames: Vec<Frame>,
    depth: usize,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(ContextKind::Root)],
            depth: 0,
        }
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn current(&self) -> &Frame {
        &self.frames[self.depth]
    }

    pub(crate) fn current_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.depth]
    }

    /// The frame enclosing the current one.
    #[must_use]
    pub fn parent(&self) -> Option<&Frame> {
        self.depth.checked_sub(1).map(|d| &self.frames[d])
    }

    pub(crate) fn push(&mut self, kind: ContextKind) {
        self.depth += 1;
        if let Some(slot) = self.frames.get_mut(self.depth) {
            slot.reset(kind);
        } else {
            self.frames.push(Frame::new(kind));
        }
    }

    /// Closes the current container and returns its kind. The root frame is
    /// never popped.
    pub(crate) fn pop(&mut self) -> Option<ContextKind> {
        if self.depth == 0 {
            return None;
        }
        let frame = &mut self.frames[self.depth];
        frame.name = None;
        let kind = frame.kind;
        self.depth -= 1;
        Some(kind)
    }

    // ---------------------------------------------------------------------
    // Generator-side validation. Each check leaves the stack untouched on
    // failure so a rejected call emits nothing.
    // ---------------------------------------------------------------------

    pub(crate) fn write_field_name(&mut self) -> Result<WriteStatus, StructureError> {
        let frame = self.current_mut();
        if frame.kind != ContextKind::Object {
            return Err(StructureError::NameOutsideObject);
        }
        if frame.expects_value {
            return Err(StructureError::NameWhereValueExpected);
        }
        let status = if frame.entries > 0 {
            WriteStatus::AfterComma
        } else {
            WriteStatus::AsIs
        };
        frame.entries += 1;
        frame.expects_value = true;
        Ok(status)
    }

    pub(crate) fn write_value(&mut self) -> Result<WriteStatus, StructureError> {
        let frame = self.current_mut();
        let status = match frame.kind {
            ContextKind::Object => {
                if !frame.expects_value {
                    return Err(StructureError::ValueWhereNameExpected);
                }
                WriteStatus::AsIs
            }
            ContextKind::Array if frame.entries > 0 => WriteStatus::AfterComma,
            ContextKind::Root if frame.entries > 0 => WriteStatus::AfterRootValue,
            ContextKind::Array | ContextKind::Root => WriteStatus::AsIs,
        };
        frame.note_value();
        Ok(status)
    }

    pub(crate) fn check_close(&self, closing: ContextKind) -> Result<(), StructureError> {
        let frame = self.current();
        if frame.kind != closing {
            return Err(StructureError::MismatchedClose {
                closing: closing.describe(),
                current: frame.kind.describe(),
            });
        }
        if frame.expects_value {
            return Err(StructureError::DanglingName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_reuses_slots() {
        let mut stack = ContextStack::new();
        stack.push(ContextKind::Array);
        stack.push(ContextKind::Object);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), Some(ContextKind::Object));
        assert_eq!(stack.pop(), Some(ContextKind::Array));
        assert_eq!(stack.pop(), None);
        stack.push(ContextKind::Object);
        assert!(stack.current().in_object());
        assert_eq!(stack.current().entry_count(), 0);
        assert_eq!(stack.frames.len(), 3);
    }

    #[test]
    fn write_sequence_validation() {
        let mut stack = ContextStack::new();
        assert_eq!(
            stack.write_field_name(),
            Err(StructureError::NameOutsideObject)
        );
        assert_eq!(stack.write_value(), Ok(WriteStatus::AsIs));
        stack.push(ContextKind::Object);
        assert_eq!(stack.write_value(), Err(StructureError::ValueWhereNameExpected));
        assert_eq!(stack.write_field_name(), Ok(WriteStatus::AsIs));
        assert_eq!(
            stack.write_field_name(),
            Err(StructureError::NameWhereValueExpected)
        );
        assert_eq!(stack.check_close(ContextKind::Object), Err(StructureError::DanglingName));
        assert_eq!(stack.write_value(), Ok(WriteStatus::AsIs));
        assert_eq!(stack.write_field_name(), Ok(WriteStatus::AfterComma));
        assert_eq!(
            stack.check_close(ContextKind::Array),
            Err(StructureError::MismatchedClose {
                closing: "an array",
                current: "an object"
            })
        );
    }

    #[test]
    fn root_values_are_separated() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.write_value(), Ok(WriteStatus::AsIs));
        assert_eq!(stack.write_value(), Ok(WriteStatus::AfterRootValue));
    }
}
