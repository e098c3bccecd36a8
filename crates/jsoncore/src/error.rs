use core::fmt;
use std::io;

use thiserror::Error;

use crate::{symbols::CollisionLimitError, token::Token};

/// Position of a token (or of a failure) in the input.
///
/// Text parsers track lines and columns; both are 1-based and columns count
/// bytes from the start of the line. Binary parsers only know the byte offset
/// and report `line == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub byte_offset: u64,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub(crate) fn at_offset(byte_offset: u64) -> Self {
        Self {
            byte_offset,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "byte offset {}", self.byte_offset)
        } else {
            write!(
                f,
                "line {}, column {} (byte offset {})",
                self.line, self.column, self.byte_offset
            )
        }
    }
}

/// Malformed input, in either the text or the binary encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected byte 0x{0:02X}")]
    UnexpectedByte(u8),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected end of input: {0} was never closed")]
    UnclosedContainer(&'static str),
    #[error("unexpected end of input in string value")]
    UnterminatedString,
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("unrecognized token '{0}': expected 'true', 'false' or 'null'")]
    InvalidLiteral(String),
    #[error("unrecognized character escape '\\{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence at character: '{0}'")]
    InvalidUnicodeEscapeChar(char),
    #[error("unpaired high surrogate \\u{0:04X}: expected a following low surrogate")]
    LoneHighSurrogate(u16),
    #[error("unexpected low surrogate \\u{0:04X} without a preceding high surrogate")]
    LoneLowSurrogate(u16),
    #[error("invalid UTF-8 start byte 0x{0:02X}")]
    InvalidUtf8(u8),
    #[error("illegal unquoted control character 0x{0:02X} in string")]
    ControlChar(u8),
    #[error("malformed number: {0}")]
    MalformedNumber(&'static str),
    #[error("unexpected close marker '{found}': expected '{expected}'")]
    MismatchedClose { found: char, expected: char },
    #[error("unexpected close marker '{0}' at root level")]
    UnmatchedClose(char),
    #[error("trailing comma before '{0}'")]
    TrailingComma(char),
    #[error("trailing content after the root value")]
    TrailingContent,
    #[error("maximum nesting depth {0} exceeded")]
    DepthLimit(usize),
    #[error("invalid Smile header")]
    InvalidHeader,
    #[error("unsupported Smile version {0}")]
    UnsupportedVersion(u8),
    #[error("unexpected Smile opcode 0x{0:02X} {1}")]
    UnexpectedOpcode(u8, &'static str),
    #[error("invalid shared {kind} reference #{index}: only {size} entries seen")]
    InvalidBackReference {
        kind: &'static str,
        index: usize,
        size: usize,
    },
    #[error("raw binary content found but not enabled in the header")]
    RawBinaryDisabled,
    #[error("variable-length integer overflow")]
    VIntOverflow,
}

/// Error returned while reading tokens.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("syntax error: {error} at {location}")]
    Syntax {
        error: SyntaxError,
        location: Location,
    },
    #[error(transparent)]
    Symbols(#[from] CollisionLimitError),
    #[error("numeric value ({text}) out of range of {target}")]
    NumberOutOfRange { text: String, target: &'static str },
    #[error("current token ({0:?}) is not {1}")]
    WrongToken(Option<Token>, &'static str),
    #[error("invalid base64 content: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

impl ParserError {
    pub(crate) fn syntax(error: SyntaxError, location: Location) -> Self {
        Self::Syntax { error, location }
    }

    /// The syntax error kind, if this is a syntax error.
    #[must_use]
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Where the failure was detected, for syntax errors.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Syntax { location, .. } => Some(*location),
            _ => None,
        }
    }
}

/// A write call issued out of sequence. These are caller bugs: the generator
/// refuses the call and writes nothing for it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    #[error("can not write a field name outside of an object")]
    NameOutsideObject,
    #[error("can not write a field name, expecting a value")]
    NameWhereValueExpected,
    #[error("can not write a value, expecting a field name")]
    ValueWhereNameExpected,
    #[error("can not close {closing}: current context is {current}")]
    MismatchedClose {
        closing: &'static str,
        current: &'static str,
    },
    #[error("can not close object: field name written without a value")]
    DanglingName,
    #[error("generator is closed")]
    Closed,
}

/// Error returned while writing tokens.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid write: {0}")]
    Structure(#[from] StructureError),
    #[error("non-finite number {0} can not be written")]
    NonFiniteNumber(f64),
    #[error("invalid number literal '{0}'")]
    InvalidNumberText(String),
    #[error("numeric value ({text}) out of range of {target}")]
    NumberOutOfRange { text: String, target: &'static str },
}

impl GeneratorError {
    /// The structural violation, if this is a caller-contract error.
    #[must_use]
    pub fn structure_error(&self) -> Option<StructureError> {
        match self {
            Self::Structure(e) => Some(*e),
            _ => None,
        }
    }
}

/// Failure while piping one token stream into a sink.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("read failed: {0}")]
    Read(#[from] ParserError),
    #[error("write failed: {0}")]
    Write(#[from] GeneratorError),
}
