/// Configuration options for the text tokenizer.
///
/// # Default
///
/// Strict RFC 8259 input, names interned, encoding auto-detected, nesting
/// limited to 1000 levels.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserOptions {
    /// Whether to parse multiple whitespace-separated root values.
    ///
    /// Supports JSON Lines and plain concatenation:
    ///
    /// ```json
    /// {}{}{}
    /// ```
    ///
    /// ```json
    /// 123 45 678 9
    /// ```
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_values: bool,

    /// Whether a comma may directly precede `]` or `}`.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_trailing_comma: bool,

    /// Whether raw control characters (below U+0020) may appear inside
    /// strings.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unescaped_control_chars: bool,

    /// Whether field names go through the symbol table. When off, every name
    /// is a fresh copy.
    ///
    /// # Default
    ///
    /// `true`
    pub canonicalize_names: bool,

    /// Whether byte input is sniffed for UTF-16/UTF-32. When off, byte input
    /// is taken as UTF-8.
    ///
    /// # Default
    ///
    /// `true`
    pub detect_encoding: bool,

    /// Deepest container nesting accepted.
    ///
    /// # Default
    ///
    /// `1000`
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_multiple_values: false,
            allow_trailing_comma: false,
            allow_unescaped_control_chars: false,
            canonicalize_names: true,
            detect_encoding: true,
            max_depth: 1000,
        }
    }
}

/// Configuration options for the text generator.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorOptions {
    /// Whether everything above U+007F is written as `\uXXXX` escapes,
    /// supplementary code points as surrogate pairs.
    ///
    /// # Default
    ///
    /// `false`
    pub escape_non_ascii: bool,

    /// Written between consecutive root values. `None` writes them back to
    /// back.
    ///
    /// # Default
    ///
    /// `Some(' ')`
    pub root_value_separator: Option<char>,

    /// Whether closing the generator writes the end markers of containers
    /// still open.
    ///
    /// # Default
    ///
    /// `true`
    pub auto_close_content: bool,

    /// Whether NaN and the infinities are written as the strings `"NaN"`,
    /// `"Infinity"` and `"-Infinity"` instead of being refused.
    ///
    /// # Default
    ///
    /// `false`
    pub write_non_finite_as_strings: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            escape_non_ascii: false,
            root_value_separator: Some(' '),
            auto_close_content: true,
            write_non_finite_as_strings: false,
        }
    }
}
