//! Pull tokenizer for JSON text.
//!
//! The tokenizer reads UTF-8 through a [`ByteInput`] window. String content
//! is scanned in ASCII runs straight out of the window; escapes and
//! multi-byte sequences take the slow path, which refills the window as
//! needed without splitting a sequence. Numbers keep their literal text and
//! are only converted when a numeric accessor asks for them.

use std::{borrow::Cow, io::Read};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bigdecimal::BigDecimal;

use super::{
    bootstrap::CharsReader,
    escape::{UnicodeEscapeBuffer, combine_surrogates, is_high_surrogate, is_low_surrogate},
    literal::{ExpectedLiteral, Step},
    options::ParserOptions,
};
use crate::{
    context::{ContextKind, ContextStack},
    error::{Location, ParserError, SyntaxError},
    input::ByteInput,
    numbers,
    recycler::{IoContext, Recycled},
    stream::TokenStream,
    symbols::{ByteQuadsCanonicalizer, CharsToNameCanonicalizer, Interner, Name},
    token::{Number, NumberType, Token},
};

/// Streaming JSON tokenizer over a UTF-8 byte source.
pub struct JsonParser<R> {
    input: ByteInput<R>,
    options: ParserOptions,
    symbols: Interner,
    contexts: ContextStack,
    token: Option<Token>,
    /// Decoded string content, or the literal text of a number.
    text: Recycled<String>,
    /// Scratch for names that cannot be interned straight from the window.
    name_buf: Recycled<String>,
    escape: UnicodeEscapeBuffer,
    token_location: Location,
    failed: bool,
    io: IoContext,
}

impl<R: Read> JsonParser<R> {
    /// Parser over UTF-8 input with default options, a private symbol table
    /// and the process-wide buffer pool.
    pub fn new(reader: R) -> Self {
        let symbols = Interner::Quads(ByteQuadsCanonicalizer::default().make_child());
        Self::with_parts(reader, IoContext::default(), symbols, ParserOptions::default())
    }

    pub(crate) fn with_parts(
        reader: R,
        io: IoContext,
        symbols: Interner,
        options: ParserOptions,
    ) -> Self {
        let symbols = if options.canonicalize_names {
            symbols
        } else {
            Interner::Disabled
        };
        Self {
            input: ByteInput::new(reader, io.read_io_buffer()),
            options,
            symbols,
            contexts: ContextStack::new(),
            token: None,
            text: io.token_buffer(),
            name_buf: io.name_copy_buffer(),
            escape: UnicodeEscapeBuffer::new(),
            token_location: Location::default(),
            failed: false,
            io,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    #[must_use]
    pub fn io_context(&self) -> &IoContext {
        &self.io
    }

    /// Context stack; the current frame is the innermost open container.
    #[must_use]
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    fn error(&self, error: SyntaxError) -> ParserError {
        ParserError::syntax(error, self.input.location())
    }

    fn advance(&mut self) -> Result<Option<Token>, ParserError> {
        if self.token == Some(Token::FieldName) {
            let b = self.skip_whitespace()?;
            let Some(b) = b else {
                return Err(self.error(SyntaxError::UnclosedContainer("an object")));
            };
            self.token_location = self.input.location();
            return self.parse_value(b).map(Some);
        }

        let Some(mut b) = self.skip_whitespace()? else {
            return self.end_of_input();
        };
        let frame = self.contexts.current();
        let kind = frame.kind();
        let entries = frame.entry_count();
        let mut after_comma = false;

        if kind != ContextKind::Root && entries > 0 {
            let close = if kind == ContextKind::Array { b']' } else { b'}' };
            if b == close {
                self.token_location = self.input.location();
                return self.close_container(b).map(Some);
            }
            if b != b',' {
                return Err(self.error(SyntaxError::Expected(if kind == ContextKind::Array {
                    "',' or ']' between array entries"
                } else {
                    "',' or '}' between object entries"
                })));
            }
            self.input.bump();
            after_comma = true;
            b = match self.skip_whitespace()? {
                Some(b) => b,
                None => return self.end_of_input(),
            };
        }

        self.token_location = self.input.location();
        match (kind, b) {
            (ContextKind::Root, b']' | b'}') => {
                Err(self.error(SyntaxError::UnmatchedClose(char::from(b))))
            }
            (ContextKind::Root, _) if entries > 0 && !self.options.allow_multiple_values => {
                Err(self.error(SyntaxError::TrailingContent))
            }
            (_, b']' | b'}') if after_comma => {
                if self.options.allow_trailing_comma {
                    self.close_container(b).map(Some)
                } else {
                    Err(self.error(SyntaxError::TrailingComma(char::from(b))))
                }
            }
            (ContextKind::Array | ContextKind::Object, b']' | b'}') => {
                self.close_container(b).map(Some)
            }
            (ContextKind::Object, b'"') => {
                self.input.bump();
                self.parse_name()?;
                Ok(Some(Token::FieldName))
            }
            (ContextKind::Object, _) => {
                Err(self.error(SyntaxError::Expected("a double-quoted field name")))
            }
            _ => self.parse_value(b).map(Some),
        }
    }

    fn end_of_input(&mut self) -> Result<Option<Token>, ParserError> {
        let kind = self.contexts.current().kind();
        if kind != ContextKind::Root {
            return Err(self.error(SyntaxError::UnclosedContainer(kind.describe())));
        }
        self.token_location = self.input.location();
        self.symbols.release();
        Ok(None)
    }

    /// Returns the next significant byte without consuming it.
    fn skip_whitespace(&mut self) -> Result<Option<u8>, ParserError> {
        loop {
            let Some(b) = self.input.peek()? else {
                return Ok(None);
            };
            match b {
                b' ' | b'\t' | b'\r' => self.input.bump(),
                b'\n' => {
                    self.input.bump();
                    self.input.newline();
                }
                _ => return Ok(Some(b)),
            }
        }
    }

    fn close_container(&mut self, b: u8) -> Result<Token, ParserError> {
        let (token, kind) = if b == b']' {
            (Token::EndArray, ContextKind::Array)
        } else {
            (Token::EndObject, ContextKind::Object)
        };
        let current = self.contexts.current().kind();
        if current != kind {
            let expected = if current == ContextKind::Array { ']' } else { '}' };
            return Err(self.error(SyntaxError::MismatchedClose {
                found: char::from(b),
                expected,
            }));
        }
        self.input.bump();
        self.contexts.pop();
        Ok(token)
    }

    fn open_container(&mut self, kind: ContextKind) -> Result<(), ParserError> {
        if self.contexts.depth() >= self.options.max_depth {
            return Err(self.error(SyntaxError::DepthLimit(self.options.max_depth)));
        }
        self.input.bump();
        self.contexts.current_mut().note_value();
        self.contexts.push(kind);
        Ok(())
    }

    fn parse_value(&mut self, b: u8) -> Result<Token, ParserError> {
        let token = match b {
            b'{' => {
                self.open_container(ContextKind::Object)?;
                return Ok(Token::StartObject);
            }
            b'[' => {
                self.open_container(ContextKind::Array)?;
                return Ok(Token::StartArray);
            }
            b'"' => {
                self.input.bump();
                let mut text = core::mem::take(&mut *self.text);
                text.clear();
                let scanned = self.scan_string(&mut text);
                *self.text = text;
                scanned?;
                Token::String
            }
            b'-' | b'0'..=b'9' => self.parse_number()?,
            b't' | b'f' | b'n' => self.parse_literal(b)?,
            _ => return Err(self.unexpected(b)),
        };
        self.contexts.current_mut().note_value();
        Ok(token)
    }

    fn unexpected(&mut self, b: u8) -> ParserError {
        if b.is_ascii() {
            return self.error(SyntaxError::UnexpectedChar(char::from(b)));
        }
        let len = utf8_len(b);
        let decoded = match self.input.ensure(len) {
            Ok(true) => bstr::decode_utf8(self.input.available()).0,
            _ => None,
        };
        match decoded {
            Some(c) => self.error(SyntaxError::UnexpectedChar(c)),
            None => self.error(SyntaxError::UnexpectedByte(b)),
        }
    }

    fn parse_name(&mut self) -> Result<(), ParserError> {
        let avail = self.input.available();
        let run = avail
            .iter()
            .position(|&b| b == b'"' || b == b'\\' || b < 0x20)
            .filter(|&n| avail[n] == b'"');
        if let Some(n) = run {
            if let Ok(text) = core::str::from_utf8(&avail[..n]) {
                let name = self.symbols.intern(text)?;
                self.input.consume(n + 1);
                return self.finish_name(name);
            }
        }

        let mut buf = core::mem::take(&mut *self.name_buf);
        buf.clear();
        let scanned = self.scan_string(&mut buf);
        let interned = match scanned {
            Ok(()) => self.symbols.intern(&buf).map_err(ParserError::from),
            Err(e) => Err(e),
        };
        *self.name_buf = buf;
        self.finish_name(interned?)
    }

    fn finish_name(&mut self, name: Name) -> Result<(), ParserError> {
        match self.skip_whitespace()? {
            Some(b':') => self.input.bump(),
            Some(_) => return Err(self.error(SyntaxError::Expected("':' after field name"))),
            None => return Err(self.error(SyntaxError::UnclosedContainer("an object"))),
        }
        self.contexts.current_mut().set_name(name);
        Ok(())
    }

    /// Scans string content after the opening quote, through the closing
    /// quote, appending the decoded text to `out`.
    fn scan_string(&mut self, out: &mut String) -> Result<(), ParserError> {
        loop {
            let avail = self.input.available();
            let run = avail
                .iter()
                .position(|&b| b == b'"' || b == b'\\' || b < 0x20 || b >= 0x80)
                .unwrap_or(avail.len());
            out.extend(avail[..run].iter().map(|&b| char::from(b)));
            self.input.consume(run);

            let Some(b) = self.input.peek()? else {
                return Err(self.error(SyntaxError::UnterminatedString));
            };
            match b {
                b'"' => {
                    self.input.bump();
                    return Ok(());
                }
                b'\\' => {
                    self.input.bump();
                    let c = self.read_escape()?;
                    out.push(c);
                }
                0x00..=0x1F => {
                    if !self.options.allow_unescaped_control_chars {
                        return Err(self.error(SyntaxError::ControlChar(b)));
                    }
                    self.input.bump();
                    if b == b'\n' {
                        self.input.newline();
                    }
                    out.push(char::from(b));
                }
                _ => {
                    let c = self.read_multibyte(b)?;
                    out.push(c);
                }
            }
        }
    }

    /// Decodes one multi-byte UTF-8 sequence starting with `lead`, refilling
    /// the window if the sequence is cut off.
    fn read_multibyte(&mut self, lead: u8) -> Result<char, ParserError> {
        let len = utf8_len(lead);
        if len == 0 {
            return Err(self.error(SyntaxError::InvalidUtf8(lead)));
        }
        if !self.input.ensure(len)? {
            return Err(self.error(SyntaxError::UnterminatedString));
        }
        match bstr::decode_utf8(&self.input.available()[..len]) {
            (Some(c), size) if size == len => {
                self.input.consume(len);
                Ok(c)
            }
            _ => Err(self.error(SyntaxError::InvalidUtf8(lead))),
        }
    }

    fn read_escape(&mut self) -> Result<char, ParserError> {
        let Some(b) = self.input.next_byte()? else {
            return Err(self.error(SyntaxError::UnterminatedString));
        };
        let c = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let unit = self.read_hex4()?;
                if is_high_surrogate(unit) {
                    let pair = self.input.next_byte()? == Some(b'\\')
                        && self.input.next_byte()? == Some(b'u');
                    if !pair {
                        return Err(self.error(SyntaxError::LoneHighSurrogate(unit)));
                    }
                    let low = self.read_hex4()?;
                    if !is_low_surrogate(low) {
                        return Err(self.error(SyntaxError::LoneHighSurrogate(unit)));
                    }
                    combine_surrogates(unit, low)
                } else if is_low_surrogate(unit) {
                    return Err(self.error(SyntaxError::LoneLowSurrogate(unit)));
                } else {
                    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
                }
            }
            other => {
                let shown = if other.is_ascii() {
                    char::from(other)
                } else {
                    char::REPLACEMENT_CHARACTER
                };
                return Err(self.error(SyntaxError::InvalidEscape(shown)));
            }
        };
        Ok(c)
    }

    fn read_hex4(&mut self) -> Result<u16, ParserError> {
        self.escape.reset();
        loop {
            let Some(b) = self.input.next_byte()? else {
                return Err(self.error(SyntaxError::UnterminatedString));
            };
            match self.escape.feed(b) {
                Ok(Some(unit)) => return Ok(unit),
                Ok(None) => {}
                Err(e) => return Err(self.error(e)),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Token, ParserError> {
        self.text.clear();
        let mut is_float = false;
        if self.input.peek()? == Some(b'-') {
            self.input.bump();
            self.text.push('-');
        }
        match self.input.peek()? {
            Some(b'0') => {
                self.input.bump();
                self.text.push('0');
                if self.input.peek()?.is_some_and(|b| b.is_ascii_digit()) {
                    return Err(self.error(SyntaxError::MalformedNumber(
                        "leading zeroes not allowed",
                    )));
                }
            }
            Some(b'1'..=b'9') => {
                self.scan_digits()?;
            }
            _ => {
                return Err(self.error(SyntaxError::MalformedNumber(
                    "expected digit after minus sign",
                )));
            }
        }
        if self.input.peek()? == Some(b'.') {
            self.input.bump();
            self.text.push('.');
            is_float = true;
            if self.scan_digits()? == 0 {
                return Err(self.error(SyntaxError::MalformedNumber(
                    "expected digit after decimal point",
                )));
            }
        }
        if let Some(e @ (b'e' | b'E')) = self.input.peek()? {
            self.input.bump();
            self.text.push(char::from(e));
            is_float = true;
            if let Some(sign @ (b'+' | b'-')) = self.input.peek()? {
                self.input.bump();
                self.text.push(char::from(sign));
            }
            if self.scan_digits()? == 0 {
                return Err(self.error(SyntaxError::MalformedNumber(
                    "expected digit in exponent",
                )));
            }
        }
        self.check_delimiter()?;
        Ok(if is_float { Token::Float } else { Token::Integer })
    }

    fn scan_digits(&mut self) -> Result<usize, ParserError> {
        let mut count = 0;
        loop {
            let avail = self.input.available();
            let run = avail
                .iter()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(avail.len());
            self.text
                .extend(avail[..run].iter().map(|&b| char::from(b)));
            self.input.consume(run);
            count += run;
            if !self.input.available().is_empty() || !self.input.fill()? {
                return Ok(count);
            }
        }
    }

    /// A number or literal must be followed by whitespace, a separator, a
    /// closing bracket, or end of input.
    fn check_delimiter(&mut self) -> Result<(), ParserError> {
        match self.input.peek()? {
            None | Some(b' ' | b'\t' | b'\r' | b'\n' | b',' | b']' | b'}') => Ok(()),
            Some(b) => Err(self.unexpected(b)),
        }
    }

    fn parse_literal(&mut self, first: u8) -> Result<Token, ParserError> {
        let Some(mut literal) = ExpectedLiteral::new(first) else {
            return Err(self.unexpected(first));
        };
        self.input.bump();
        loop {
            let Some(b) = self.input.peek()? else {
                let seen = literal.matched().to_owned();
                return Err(self.error(SyntaxError::InvalidLiteral(seen)));
            };
            match literal.step(b) {
                Step::NeedMore => self.input.bump(),
                Step::Done(token) => {
                    self.input.bump();
                    if self
                        .input
                        .peek()?
                        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
                    {
                        return Err(self.invalid_literal(literal.spelling().to_owned()));
                    }
                    self.check_delimiter()?;
                    return Ok(token);
                }
                Step::Reject => return Err(self.invalid_literal(literal.matched().to_owned())),
            }
        }
    }

    /// Collects the rest of a misspelled identifier for the error message.
    fn invalid_literal(&mut self, mut seen: String) -> ParserError {
        while seen.len() < 32 {
            match self.input.peek() {
                Ok(Some(b)) if b.is_ascii_alphanumeric() || b == b'_' => {
                    self.input.bump();
                    seen.push(char::from(b));
                }
                _ => break,
            }
        }
        self.error(SyntaxError::InvalidLiteral(seen))
    }

    fn numeric_text(&self, what: &'static str) -> Result<&str, ParserError> {
        match self.token {
            Some(Token::Integer | Token::Float) => Ok(&self.text),
            other => Err(ParserError::WrongToken(other, what)),
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, or 0 if `lead` cannot
/// start one.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

impl<I: Iterator<Item = char>> JsonParser<CharsReader<I>> {
    /// Parser over a character stream. Names go through a private chars
    /// table.
    pub fn from_chars(chars: I) -> Self {
        let symbols = Interner::Chars(CharsToNameCanonicalizer::default().make_child());
        Self::with_parts(
            CharsReader::new(chars),
            IoContext::default(),
            symbols,
            ParserOptions::default(),
        )
    }
}

impl<R: Read> TokenStream for JsonParser<R> {
    fn next_token(&mut self) -> Result<Option<Token>, ParserError> {
        if self.failed {
            return Ok(None);
        }
        match self.advance() {
            Ok(token) => {
                self.token = token;
                Ok(token)
            }
            Err(e) => {
                log::debug!("JSON parse failed: {e}");
                self.failed = true;
                self.token = None;
                Err(e)
            }
        }
    }

    fn current_token(&self) -> Option<Token> {
        self.token
    }

    fn current_name(&self) -> Option<&Name> {
        match self.token? {
            Token::StartObject | Token::StartArray => self.contexts.parent()?.name(),
            _ => self.contexts.current().name(),
        }
    }

    fn text(&self) -> Option<Cow<'_, str>> {
        match self.token? {
            Token::FieldName => self.contexts.current().name().map(|n| Cow::Borrowed(n.as_str())),
            Token::String | Token::Integer | Token::Float => Some(Cow::Borrowed(self.text.as_str())),
            other => other.as_static_str().map(Cow::Borrowed),
        }
    }

    fn number_type(&self) -> Result<NumberType, ParserError> {
        match self.token {
            Some(Token::Integer) => Ok(numbers::integer_type(&self.text)),
            Some(Token::Float) => Ok(NumberType::Double),
            other => Err(ParserError::WrongToken(other, "a number")),
        }
    }

    fn number_value(&self) -> Result<Number, ParserError> {
        match self.token {
            Some(Token::Integer) => numbers::integer_value(&self.text),
            Some(Token::Float) => numbers::float_value(&self.text).map(Number::Double),
            other => Err(ParserError::WrongToken(other, "a number")),
        }
    }

    fn big_decimal_value(&self) -> Result<BigDecimal, ParserError> {
        numbers::decimal_value(self.numeric_text("a number")?)
    }

    fn binary_value(&self) -> Result<Cow<'_, [u8]>, ParserError> {
        match self.token {
            Some(Token::String) => Ok(Cow::Owned(STANDARD.decode(self.text.as_bytes())?)),
            other => Err(ParserError::WrongToken(other, "base64 text")),
        }
    }

    fn token_location(&self) -> Location {
        self.token_location
    }

    fn current_location(&self) -> Location {
        self.input.location()
    }

    fn depth(&self) -> usize {
        self.contexts.depth()
    }
}

impl<R> Drop for JsonParser<R> {
    fn drop(&mut self) {
        self.symbols.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Seed;

    fn parser(input: &str) -> JsonParser<&[u8]> {
        JsonParser::new(input.as_bytes())
    }

    fn tokens(input: &str) -> Result<Vec<Token>, ParserError> {
        let mut p = parser(input);
        let mut out = Vec::new();
        while let Some(t) = p.next_token()? {
            out.push(t);
        }
        Ok(out)
    }

    #[test]
    fn simple_object() {
        let mut p = parser(r#"{"a": [1, 2.5, "x"], "b": null}"#);
        assert_eq!(p.next_token().unwrap(), Some(Token::StartObject));
        assert_eq!(p.next_token().unwrap(), Some(Token::FieldName));
        assert_eq!(p.current_name().unwrap(), "a");
        assert_eq!(p.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(p.current_name().unwrap(), "a");
        assert_eq!(p.next_token().unwrap(), Some(Token::Integer));
        assert_eq!(p.i32_value().unwrap(), 1);
        assert_eq!(p.next_token().unwrap(), Some(Token::Float));
        assert_eq!(p.f64_value().unwrap(), 2.5);
        assert_eq!(p.next_token().unwrap(), Some(Token::String));
        assert_eq!(p.text().unwrap(), "x");
        assert_eq!(p.next_token().unwrap(), Some(Token::EndArray));
        assert_eq!(p.next_token().unwrap(), Some(Token::FieldName));
        assert_eq!(p.next_token().unwrap(), Some(Token::Null));
        assert_eq!(p.current_name().unwrap(), "b");
        assert_eq!(p.next_token().unwrap(), Some(Token::EndObject));
        assert_eq!(p.next_token().unwrap(), None);
    }

    #[test]
    fn surrogate_pair_escape() {
        let mut p = parser(r#"{"text":"\uD83D\uDE03"}"#);
        p.next_token().unwrap();
        p.next_token().unwrap();
        assert_eq!(p.next_token().unwrap(), Some(Token::String));
        assert_eq!(p.text().unwrap(), "\u{1F603}");
    }

    #[test]
    fn lone_surrogates_fail() {
        let err = tokens(r#"["\uD83D"]"#).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::LoneHighSurrogate(0xD83D)));
        let err = tokens(r#"["\uDE03"]"#).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::LoneLowSurrogate(0xDE03)));
        let err = tokens(r#"["\uD83DA"]"#).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::LoneHighSurrogate(0xD83D)));
    }

    #[test]
    fn names_are_interned_within_a_document() {
        let mut p = parser(r#"[{"key":1},{"key":2},{"key":3}]"#);
        let mut names = Vec::new();
        while let Some(t) = p.next_token().unwrap() {
            if t == Token::FieldName {
                names.push(p.current_name().unwrap().clone());
            }
        }
        assert_eq!(names.len(), 3);
        assert!(Name::ptr_eq(&names[0], &names[1]));
        assert!(Name::ptr_eq(&names[0], &names[2]));
    }

    #[test]
    fn canonicalization_can_be_disabled() {
        let options = ParserOptions {
            canonicalize_names: false,
            ..ParserOptions::default()
        };
        let root = ByteQuadsCanonicalizer::new(Seed::Fixed(1));
        let mut p = JsonParser::with_parts(
            &br#"[{"a":1},{"a":2}]"#[..],
            IoContext::default(),
            Interner::Quads(root.make_child()),
            options,
        );
        let mut names = Vec::new();
        while let Some(t) = p.next_token().unwrap() {
            if t == Token::FieldName {
                names.push(p.current_name().unwrap().clone());
            }
        }
        assert!(!Name::ptr_eq(&names[0], &names[1]));
        drop(p);
        assert_eq!(root.stats().size, 0);
    }

    #[test]
    fn errors_stop_the_stream() {
        let mut p = parser("[1 2]");
        assert_eq!(p.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(p.next_token().unwrap(), Some(Token::Integer));
        let err = p.next_token().unwrap_err();
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::Expected("',' or ']' between array entries"))
        );
        assert_eq!(p.next_token().unwrap(), None);
        assert_eq!(p.current_token(), None);
    }

    #[test]
    fn error_location_points_at_failure() {
        let err = tokens("{\n  \"a\": tru }").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!(loc.line, 2);
        assert!(err.to_string().contains("line 2"));
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::InvalidLiteral("tru".into()))
        );
    }

    #[test]
    fn depth_limit() {
        let options = ParserOptions {
            max_depth: 2,
            ..ParserOptions::default()
        };
        let mut p = JsonParser::with_parts(
            &b"[[[]]]"[..],
            IoContext::default(),
            Interner::Disabled,
            options,
        );
        p.next_token().unwrap();
        p.next_token().unwrap();
        let err = p.next_token().unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::DepthLimit(2)));
    }

    #[test]
    fn skip_children_lands_on_matching_end() {
        let mut p = parser(r#"{"skip":{"x":[1,{"y":2}]},"keep":true}"#);
        p.next_token().unwrap();
        p.next_token().unwrap();
        assert_eq!(p.next_token().unwrap(), Some(Token::StartObject));
        p.skip_children().unwrap();
        assert_eq!(p.current_token(), Some(Token::EndObject));
        assert_eq!(p.depth(), 1);
        assert_eq!(p.next_token().unwrap(), Some(Token::FieldName));
        assert_eq!(p.current_name().unwrap(), "keep");
    }

    #[test]
    fn base64_strings_decode_as_binary() {
        let mut p = parser(r#""AQID/wgAKg==""#);
        p.next_token().unwrap();
        assert_eq!(&*p.binary_value().unwrap(), &[1, 2, 3, 255, 8, 0, 42]);
    }

    #[test]
    fn character_input() {
        let mut p = JsonParser::from_chars("[\"caf\u{e9}\", \"\u{1F600}\"]".chars());
        assert_eq!(p.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(p.next_token().unwrap(), Some(Token::String));
        assert_eq!(p.text().as_deref(), Some("caf\u{e9}"));
        assert_eq!(p.next_token().unwrap(), Some(Token::String));
        assert_eq!(p.text().as_deref(), Some("\u{1F600}"));
        assert_eq!(p.next_token().unwrap(), Some(Token::EndArray));
        assert_eq!(p.next_token().unwrap(), None);
    }
}
