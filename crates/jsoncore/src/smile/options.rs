/// What happens when a shared-string table reaches its capacity.
///
/// The decoder must be configured with the same policy as the encoder that
/// produced the stream, or back-references resolve to the wrong strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SharedOverflow {
    /// Forget every entry and start numbering again from zero.
    #[default]
    Reset,
    /// Keep existing entries but stop adding new ones.
    Disable,
}

/// Configuration options for the Smile parser and generator.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmileOptions {
    /// Whether repeated field names are written as back-references.
    ///
    /// # Default
    ///
    /// `true`
    pub shared_names: bool,

    /// Whether repeated short string values are written as back-references.
    ///
    /// # Default
    ///
    /// `false`
    pub shared_values: bool,

    /// Whether binary values are written as raw bytes instead of 7-bit
    /// groups.
    ///
    /// # Default
    ///
    /// `false`
    pub raw_binary: bool,

    /// Whether the generator starts its output with the 4-byte header.
    /// Without a header the reader has to be told the flags out of band.
    ///
    /// # Default
    ///
    /// `true`
    pub write_header: bool,

    /// Whether the parser refuses input that does not start with a header.
    /// When off, headerless input is decoded with the flags above.
    ///
    /// # Default
    ///
    /// `true`
    pub require_header: bool,

    /// Whether closing the generator appends the `0xFF` end-of-content
    /// marker.
    ///
    /// # Default
    ///
    /// `false`
    pub write_end_marker: bool,

    /// Shared table policy once 1024 entries have been seen.
    ///
    /// # Default
    ///
    /// [`SharedOverflow::Reset`]
    pub shared_overflow: SharedOverflow,

    /// Deepest container nesting the parser accepts.
    ///
    /// # Default
    ///
    /// `1000`
    pub max_depth: usize,
}

impl Default for SmileOptions {
    fn default() -> Self {
        Self {
            shared_names: true,
            shared_values: false,
            raw_binary: false,
            write_header: true,
            require_header: true,
            write_end_marker: false,
            shared_overflow: SharedOverflow::Reset,
            max_depth: 1000,
        }
    }
}
