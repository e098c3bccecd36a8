//! Pull tokenizer for Smile.
//!
//! Every token starts with one opcode byte; what follows it (length,
//! var-int, 7-bit groups, terminated text) is decided by the opcode and by
//! whether the parser is positioned on a field name or a value. Locations
//! are byte offsets only.

use std::{borrow::Cow, io::Read};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::{
    MAGIC, SmileHeader, opcode,
    options::SmileOptions,
    shared::SharedStrings,
    vint,
};
use crate::{
    context::{ContextKind, ContextStack},
    error::{Location, ParserError, SyntaxError},
    input::ByteInput,
    recycler::{IoContext, Recycled},
    stream::TokenStream,
    symbols::{ByteQuadsCanonicalizer, Interner, Name},
    token::{Number, NumberType, Token},
};

/// Streaming Smile tokenizer over a byte source.
pub struct SmileParser<R> {
    input: ByteInput<R>,
    options: SmileOptions,
    /// Header read from the stream, if any.
    header: Option<SmileHeader>,
    /// Features in effect: the header's, or the options' for headerless
    /// input.
    features: SmileHeader,
    symbols: Interner,
    shared_names: SharedStrings<Name>,
    shared_values: SharedStrings<Box<str>>,
    contexts: ContextStack,
    token: Option<Token>,
    text: Recycled<String>,
    /// Binary payloads, and scratch for terminated strings.
    binary: Recycled<Vec<u8>>,
    number: Option<Number>,
    token_location: Location,
    started: bool,
    finished: bool,
    failed: bool,
    io: IoContext,
}

impl<R: Read> SmileParser<R> {
    /// Parser with default options, a private symbol table and the
    /// process-wide buffer pool.
    pub fn new(reader: R) -> Self {
        let symbols = Interner::Quads(ByteQuadsCanonicalizer::default().make_child());
        Self::with_parts(reader, IoContext::default(), symbols, SmileOptions::default())
    }

    pub(crate) fn with_parts(
        reader: R,
        io: IoContext,
        symbols: Interner,
        options: SmileOptions,
    ) -> Self {
        let overflow = options.shared_overflow;
        Self {
            input: ByteInput::new(reader, io.read_io_buffer()),
            header: None,
            features: SmileHeader::from_options(&options),
            options,
            symbols,
            shared_names: SharedStrings::new("name", overflow),
            shared_values: SharedStrings::new("value", overflow),
            contexts: ContextStack::new(),
            token: None,
            text: io.token_buffer(),
            binary: io.base64_buffer(),
            number: None,
            token_location: Location::default(),
            started: false,
            finished: false,
            failed: false,
            io,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SmileOptions {
        &self.options
    }

    #[must_use]
    pub fn io_context(&self) -> &IoContext {
        &self.io
    }

    /// The most recent header read from the stream. `None` before the first
    /// token and for headerless input.
    #[must_use]
    pub fn header(&self) -> Option<SmileHeader> {
        self.header
    }

    #[must_use]
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    fn location(&self) -> Location {
        Location::at_offset(self.input.offset())
    }

    fn error(&self, error: SyntaxError) -> ParserError {
        ParserError::syntax(error, self.token_location)
    }

    fn advance(&mut self) -> Result<Option<Token>, ParserError> {
        if !self.started {
            self.read_header()?;
        }
        if self.finished {
            return Ok(None);
        }
        loop {
            self.number = None;
            self.token_location = self.location();
            let frame = self.contexts.current();
            if frame.in_object() && !frame.expects_value() {
                return self.read_key().map(Some);
            }
            let Some(b) = self.input.next_byte()? else {
                return self.end_of_input();
            };
            if b == MAGIC[0] && self.contexts.depth() == 0 {
                self.finish_header(b)?;
                continue;
            }
            return self.read_value(b);
        }
    }

    fn read_header(&mut self) -> Result<(), ParserError> {
        self.started = true;
        match self.input.peek()? {
            Some(b) if b == MAGIC[0] || self.options.require_header => {
                self.input.bump();
                self.finish_header(b)
            }
            _ => Ok(()),
        }
    }

    /// Reads the rest of a header whose first byte was just consumed. A new
    /// header starts a new document: shared tables are cleared.
    fn finish_header(&mut self, first: u8) -> Result<(), ParserError> {
        let location = Location::at_offset(self.input.offset() - 1);
        let Some(rest) = self.input.take(3)? else {
            return Err(ParserError::syntax(SyntaxError::InvalidHeader, location));
        };
        let header = SmileHeader::parse([first, rest[0], rest[1], rest[2]])
            .map_err(|e| ParserError::syntax(e, location))?;
        log::trace!("Smile header at {location}: {header:?}");
        self.header = Some(header);
        self.features = header;
        self.shared_names.clear();
        self.shared_values.clear();
        Ok(())
    }

    fn end_of_input(&mut self) -> Result<Option<Token>, ParserError> {
        let kind = self.contexts.current().kind();
        if kind != ContextKind::Root {
            return Err(self.error(SyntaxError::UnclosedContainer(kind.describe())));
        }
        self.finished = true;
        self.symbols.release();
        Ok(None)
    }

    fn read_key(&mut self) -> Result<Token, ParserError> {
        let Some(b) = self.input.next_byte()? else {
            return Err(self.error(SyntaxError::UnclosedContainer("an object")));
        };
        let name = match b {
            opcode::END_OBJECT => {
                self.contexts.pop();
                return Ok(Token::EndObject);
            }
            opcode::KEY_EMPTY => self.symbols.intern("")?,
            0x30..=0x33 => {
                let lo = self.required_byte()?;
                self.shared_name((usize::from(b & 0x03) << 8) | usize::from(lo), b)?
            }
            opcode::KEY_LONG => {
                self.read_terminated()?;
                let name = self.intern_scratch()?;
                self.remember_name(&name);
                name
            }
            0x40..=0x7F => self.shared_name(usize::from(b & 0x3F), b)?,
            0x80..=0xBF => self.short_name(usize::from(b & 0x3F) + 1)?,
            0xC0..=0xF7 => self.short_name(usize::from(b & 0x3F) + 2)?,
            _ => return Err(self.error(SyntaxError::UnexpectedOpcode(b, "in field name position"))),
        };
        self.contexts.current_mut().set_name(name);
        Ok(Token::FieldName)
    }

    fn short_name(&mut self, len: usize) -> Result<Name, ParserError> {
        let location = self.token_location;
        let Some(bytes) = self.input.take(len)? else {
            return Err(ParserError::syntax(SyntaxError::UnexpectedEndOfInput, location));
        };
        let text = check_utf8(bytes).map_err(|e| ParserError::syntax(e, location))?;
        let name = self.symbols.intern(text)?;
        self.remember_name(&name);
        Ok(name)
    }

    fn intern_scratch(&mut self) -> Result<Name, ParserError> {
        let text = check_utf8(&self.binary).map_err(|e| self.error(e))?;
        Ok(self.symbols.intern(text)?)
    }

    fn remember_name(&mut self, name: &Name) {
        if self.features.shared_names {
            self.shared_names.add(name.clone());
        }
    }

    fn shared_name(&self, index: usize, b: u8) -> Result<Name, ParserError> {
        if !self.features.shared_names {
            return Err(self.error(SyntaxError::UnexpectedOpcode(
                b,
                "(shared names not enabled)",
            )));
        }
        self.shared_names
            .get(index)
            .cloned()
            .ok_or_else(|| self.bad_reference(index, self.shared_names.kind(), self.shared_names.len()))
    }

    fn bad_reference(&self, index: usize, kind: &'static str, size: usize) -> ParserError {
        self.error(SyntaxError::InvalidBackReference { kind, index, size })
    }

    fn read_value(&mut self, b: u8) -> Result<Option<Token>, ParserError> {
        let token = match b {
            0x01..=0x1F => {
                self.shared_value(usize::from(b - 1), b)?;
                Token::String
            }
            opcode::EMPTY_STRING => {
                self.text.clear();
                Token::String
            }
            opcode::NULL => Token::Null,
            opcode::FALSE => Token::False,
            opcode::TRUE => Token::True,
            opcode::INT32 => {
                let zz = u32::try_from(self.read_vint()?)
                    .map_err(|_| self.error(SyntaxError::VIntOverflow))?;
                self.number = Some(Number::Int(vint::unzigzag32(zz)));
                Token::Integer
            }
            opcode::INT64 => {
                let zz = self.read_vint()?;
                self.number = Some(Number::Long(vint::unzigzag64(zz)));
                Token::Integer
            }
            opcode::BIG_INTEGER => {
                self.read_7bit_payload()?;
                self.number = Some(Number::BigInteger(BigInt::from_signed_bytes_be(
                    &self.binary,
                )));
                Token::Integer
            }
            opcode::FLOAT32 => {
                let groups = self.take_array::<5>()?;
                self.number = Some(Number::Float(vint::read_f32(&groups)));
                Token::Float
            }
            opcode::FLOAT64 => {
                let groups = self.take_array::<10>()?;
                self.number = Some(Number::Double(vint::read_f64(&groups)));
                Token::Float
            }
            opcode::BIG_DECIMAL => {
                let zz = u32::try_from(self.read_vint()?)
                    .map_err(|_| self.error(SyntaxError::VIntOverflow))?;
                let scale = vint::unzigzag32(zz);
                self.read_7bit_payload()?;
                let unscaled = BigInt::from_signed_bytes_be(&self.binary);
                self.number = Some(Number::BigDecimal(BigDecimal::new(
                    unscaled,
                    i64::from(scale),
                )));
                Token::Float
            }
            0x40..=0x5F => self.short_text(usize::from(b & 0x1F) + 1)?,
            0x60..=0x7F => self.short_text(usize::from(b & 0x1F) + 33)?,
            0x80..=0x9F => self.short_text(usize::from(b & 0x1F) + 2)?,
            0xA0..=0xBF => self.short_text(usize::from(b & 0x1F) + 34)?,
            0xC0..=0xDF => {
                self.number = Some(Number::Int(vint::unzigzag32(u32::from(b & 0x1F))));
                Token::Integer
            }
            opcode::LONG_ASCII | opcode::LONG_UNICODE => {
                self.read_terminated()?;
                let text = core::str::from_utf8(&self.binary)
                    .map_err(|e| self.error(utf8_error(&self.binary, &e)))?;
                self.text.clear();
                self.text.push_str(text);
                Token::String
            }
            opcode::BINARY_7BIT => {
                self.read_7bit_payload()?;
                Token::EmbeddedBinary
            }
            0xEC..=0xEF => {
                let lo = self.required_byte()?;
                self.shared_value((usize::from(b & 0x03) << 8) | usize::from(lo), b)?;
                Token::String
            }
            opcode::START_ARRAY => {
                self.open_container(ContextKind::Array)?;
                return Ok(Some(Token::StartArray));
            }
            opcode::START_OBJECT => {
                self.open_container(ContextKind::Object)?;
                return Ok(Some(Token::StartObject));
            }
            opcode::END_ARRAY => return self.close_container(ContextKind::Array, b).map(Some),
            opcode::END_OBJECT => return self.close_container(ContextKind::Object, b).map(Some),
            opcode::RAW_BINARY => {
                if !self.features.raw_binary {
                    return Err(self.error(SyntaxError::RawBinaryDisabled));
                }
                let len = self.read_len()?;
                let location = self.token_location;
                let Some(bytes) = self.input.take(len)? else {
                    return Err(ParserError::syntax(SyntaxError::UnexpectedEndOfInput, location));
                };
                self.binary.clear();
                self.binary.extend_from_slice(bytes);
                Token::EmbeddedBinary
            }
            opcode::END_OF_CONTENT if self.contexts.depth() == 0 => return self.end_of_input(),
            _ => return Err(self.error(SyntaxError::UnexpectedOpcode(b, "in value position"))),
        };
        self.contexts.current_mut().note_value();
        Ok(Some(token))
    }

    fn open_container(&mut self, kind: ContextKind) -> Result<(), ParserError> {
        if self.contexts.depth() >= self.options.max_depth {
            return Err(self.error(SyntaxError::DepthLimit(self.options.max_depth)));
        }
        self.contexts.current_mut().note_value();
        self.contexts.push(kind);
        Ok(())
    }

    fn close_container(&mut self, kind: ContextKind, b: u8) -> Result<Token, ParserError> {
        let (found, token) = match kind {
            ContextKind::Object => ('}', Token::EndObject),
            _ => (']', Token::EndArray),
        };
        let current = self.contexts.current();
        match current.kind() {
            ContextKind::Root => Err(self.error(SyntaxError::UnmatchedClose(found))),
            // Only reachable in value position, right after a field name.
            ContextKind::Object if kind == ContextKind::Object => {
                Err(self.error(SyntaxError::UnexpectedOpcode(b, "where a value was expected")))
            }
            current if current != kind => Err(self.error(SyntaxError::MismatchedClose {
                found,
                expected: if current == ContextKind::Array { ']' } else { '}' },
            })),
            _ => {
                self.contexts.pop();
                Ok(token)
            }
        }
    }

    fn short_text(&mut self, len: usize) -> Result<Token, ParserError> {
        let location = self.token_location;
        let Some(bytes) = self.input.take(len)? else {
            return Err(ParserError::syntax(SyntaxError::UnexpectedEndOfInput, location));
        };
        let text = core::str::from_utf8(bytes)
            .map_err(|e| ParserError::syntax(utf8_error(bytes, &e), location))?;
        self.text.clear();
        self.text.push_str(text);
        if self.features.shared_values {
            self.shared_values.add(self.text.as_str().into());
        }
        Ok(Token::String)
    }

    fn shared_value(&mut self, index: usize, b: u8) -> Result<(), ParserError> {
        if !self.features.shared_values {
            return Err(self.error(SyntaxError::UnexpectedOpcode(
                b,
                "(shared values not enabled)",
            )));
        }
        let Some(value) = self.shared_values.get(index) else {
            return Err(self.bad_reference(index, self.shared_values.kind(), self.shared_values.len()));
        };
        self.text.clear();
        self.text.push_str(value);
        Ok(())
    }

    fn required_byte(&mut self) -> Result<u8, ParserError> {
        match self.input.next_byte()? {
            Some(b) => Ok(b),
            None => Err(self.error(SyntaxError::UnexpectedEndOfInput)),
        }
    }

    fn read_vint(&mut self) -> Result<u64, ParserError> {
        let mut acc = 0;
        loop {
            let b = self.required_byte()?;
            if let Some(value) = vint::vint_step(&mut acc, b).map_err(|e| self.error(e))? {
                return Ok(value);
            }
        }
    }

    fn read_len(&mut self) -> Result<usize, ParserError> {
        let len = self.read_vint()?;
        usize::try_from(len).map_err(|_| self.error(SyntaxError::VIntOverflow))
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ParserError> {
        let location = self.token_location;
        match self.input.take(N)? {
            Some(bytes) => {
                let mut out = [0u8; N];
                out.copy_from_slice(bytes);
                Ok(out)
            }
            None => Err(ParserError::syntax(SyntaxError::UnexpectedEndOfInput, location)),
        }
    }

    /// Reads a length-prefixed run of 7-bit groups into `binary`.
    fn read_7bit_payload(&mut self) -> Result<(), ParserError> {
        let len = self.read_len()?;
        let location = self.token_location;
        let encoded = vint::encoded_7bit_len(len)
            .ok_or(ParserError::syntax(SyntaxError::VIntOverflow, location))?;
        let Some(groups) = self.input.take(encoded)? else {
            return Err(ParserError::syntax(SyntaxError::UnexpectedEndOfInput, location));
        };
        self.binary.clear();
        vint::decode_7bit(&mut self.binary, groups, len)
            .map_err(|e| ParserError::syntax(e, location))
    }

    /// Reads bytes up to the `0xFC` end marker into `binary`.
    fn read_terminated(&mut self) -> Result<(), ParserError> {
        self.binary.clear();
        loop {
            let avail = self.input.available();
            if let Some(n) = avail.iter().position(|&b| b == opcode::END_STRING) {
                self.binary.extend_from_slice(&avail[..n]);
                self.input.consume(n + 1);
                return Ok(());
            }
            let n = avail.len();
            self.binary.extend_from_slice(avail);
            self.input.consume(n);
            if !self.input.fill()? {
                return Err(self.error(SyntaxError::UnterminatedString));
            }
        }
    }
}

fn check_utf8(bytes: &[u8]) -> Result<&str, SyntaxError> {
    core::str::from_utf8(bytes).map_err(|e| utf8_error(bytes, &e))
}

fn utf8_error(bytes: &[u8], e: &core::str::Utf8Error) -> SyntaxError {
    SyntaxError::InvalidUtf8(bytes.get(e.valid_up_to()).copied().unwrap_or(0))
}

impl<R: Read> TokenStream for SmileParser<R> {
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
                log::debug!("Smile parse failed: {e}");
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
            Token::String => Some(Cow::Borrowed(self.text.as_str())),
            Token::Integer | Token::Float => self.number.as_ref().map(|n| Cow::Owned(n.to_string())),
            Token::EmbeddedBinary => Some(Cow::Owned(STANDARD.encode(&*self.binary))),
            other => other.as_static_str().map(Cow::Borrowed),
        }
    }

    fn number_type(&self) -> Result<NumberType, ParserError> {
        self.number
            .as_ref()
            .map(Number::number_type)
            .ok_or(ParserError::WrongToken(self.token, "a number"))
    }

    fn number_value(&self) -> Result<Number, ParserError> {
        self.number
            .clone()
            .ok_or(ParserError::WrongToken(self.token, "a number"))
    }

    fn binary_value(&self) -> Result<Cow<'_, [u8]>, ParserError> {
        match self.token {
            Some(Token::EmbeddedBinary) => Ok(Cow::Borrowed(&self.binary)),
            Some(Token::String) => Ok(Cow::Owned(STANDARD.decode(self.text.as_bytes())?)),
            other => Err(ParserError::WrongToken(other, "binary content")),
        }
    }

    fn token_location(&self) -> Location {
        self.token_location
    }

    fn current_location(&self) -> Location {
        self.location()
    }

    fn depth(&self) -> usize {
        self.contexts.depth()
    }
}

impl<R> Drop for SmileParser<R> {
    fn drop(&mut self) {
        self.symbols.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 4] = [0x3A, 0x29, 0x0A, 0x01];

    fn with_header(body: &[u8]) -> Vec<u8> {
        let mut out = HEADER.to_vec();
        out.extend_from_slice(body);
        out
    }

    fn tokens(input: &[u8]) -> Result<Vec<Token>, ParserError> {
        let mut parser = SmileParser::new(input);
        let mut out = Vec::new();
        while let Some(token) = parser.next_token()? {
            out.push(token);
        }
        Ok(out)
    }

    #[test]
    fn small_document() {
        let input = with_header(&[
            0xFA, 0x80, b'a', 0xC2, 0x80, b'b', 0xF8, 0x23, 0x21, 0x40, b'x', 0xF9, 0xFB,
        ]);
        let mut parser = SmileParser::new(&input[..]);
        assert_eq!(parser.next_token().unwrap(), Some(Token::StartObject));
        assert_eq!(parser.next_token().unwrap(), Some(Token::FieldName));
        assert_eq!(parser.current_name().map(Name::as_str), Some("a"));
        assert_eq!(parser.next_token().unwrap(), Some(Token::Integer));
        assert_eq!(parser.i32_value().unwrap(), 1);
        assert_eq!(parser.next_token().unwrap(), Some(Token::FieldName));
        assert_eq!(parser.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(parser.current_name().map(Name::as_str), Some("b"));
        assert_eq!(parser.next_token().unwrap(), Some(Token::True));
        assert_eq!(parser.next_token().unwrap(), Some(Token::Null));
        assert_eq!(parser.next_token().unwrap(), Some(Token::String));
        assert_eq!(parser.text().as_deref(), Some("x"));
        assert_eq!(parser.next_token().unwrap(), Some(Token::EndArray));
        assert_eq!(parser.next_token().unwrap(), Some(Token::EndObject));
        assert_eq!(parser.next_token().unwrap(), None);
        assert_eq!(parser.header().map(|h| h.shared_names), Some(true));
    }

    #[test]
    fn shared_name_references_resolve_to_the_same_name() {
        let input = with_header(&[
            0xF8, 0xFA, 0x80, b'a', 0xC2, 0xFB, 0xFA, 0x40, 0xC4, 0xFB, 0xF9,
        ]);
        let mut parser = SmileParser::new(&input[..]);
        let mut names = Vec::new();
        while let Some(token) = parser.next_token().unwrap() {
            if token == Token::FieldName {
                names.push(parser.current_name().cloned().unwrap());
            }
        }
        assert_eq!(names.len(), 2);
        assert!(Name::ptr_eq(&names[0], &names[1]));
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = tokens(&[0xF8, 0xF9]).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::InvalidHeader));
        assert_eq!(err.location().map(|l| l.byte_offset), Some(0));
    }

    #[test]
    fn headerless_input_when_allowed() {
        let options = SmileOptions {
            require_header: false,
            ..SmileOptions::default()
        };
        let symbols = Interner::Quads(ByteQuadsCanonicalizer::default().make_child());
        let mut parser =
            SmileParser::with_parts(&[0xF8u8, 0xC0, 0xF9][..], IoContext::default(), symbols, options);
        assert_eq!(parser.next_token().unwrap(), Some(Token::StartArray));
        assert_eq!(parser.next_token().unwrap(), Some(Token::Integer));
        assert_eq!(parser.i64_value().unwrap(), 0);
        assert_eq!(parser.next_token().unwrap(), Some(Token::EndArray));
        assert_eq!(parser.header(), None);
    }

    #[test]
    fn back_reference_beyond_table_fails() {
        let err = tokens(&with_header(&[0xFA, 0x41])).unwrap_err();
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::InvalidBackReference {
                kind: "name",
                index: 1,
                size: 0
            })
        );
    }

    #[test]
    fn shared_values_need_the_header_flag() {
        let err = tokens(&with_header(&[0xF8, 0x42, b'a', b'b', b'c', 0x01])).unwrap_err();
        assert!(matches!(
            err.syntax_error(),
            Some(SyntaxError::UnexpectedOpcode(0x01, _))
        ));

        let mut input = vec![0x3A, 0x29, 0x0A, 0x03];
        input.extend_from_slice(&[0xF8, 0x42, b'a', b'b', b'c', 0x01, 0xF9]);
        let mut parser = SmileParser::new(&input[..]);
        let mut strings = Vec::new();
        while let Some(token) = parser.next_token().unwrap() {
            if token == Token::String {
                strings.push(parser.text().unwrap().into_owned());
            }
        }
        assert_eq!(strings, ["abc", "abc"]);
    }

    #[test]
    fn raw_binary_needs_the_header_flag() {
        let err = tokens(&with_header(&[0xFD, 0x81, 0x07])).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::RawBinaryDisabled));

        let input = [0x3A, 0x29, 0x0A, 0x05, 0xFD, 0x83, 1, 2, 255];
        let mut parser = SmileParser::new(&input[..]);
        assert_eq!(parser.next_token().unwrap(), Some(Token::EmbeddedBinary));
        assert_eq!(&*parser.binary_value().unwrap(), [1, 2, 255]);
    }

    #[test]
    fn unexpected_opcode_reports_its_offset() {
        let err = tokens(&with_header(&[0xF8, 0x27])).unwrap_err();
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::UnexpectedOpcode(0x27, "in value position"))
        );
        let location = err.location().unwrap();
        assert_eq!(location.byte_offset, 5);
        assert_eq!(location.line, 0);
    }

    #[test]
    fn truncated_and_unclosed_input() {
        let err = tokens(&with_header(&[0xF8, 0x44, b'a'])).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::UnexpectedEndOfInput));

        let err = tokens(&with_header(&[0xFA, 0x80, b'a'])).unwrap_err();
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::UnclosedContainer("an object"))
        );

        let err = tokens(&with_header(&[0xE0, b'a', b'b'])).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::UnterminatedString));
    }

    #[test]
    fn mismatched_closes() {
        let err = tokens(&with_header(&[0xF8, 0xFB])).unwrap_err();
        assert_eq!(
            err.syntax_error(),
            Some(&SyntaxError::MismatchedClose {
                found: '}',
                expected: ']'
            })
        );
        let err = tokens(&with_header(&[0xF9])).unwrap_err();
        assert_eq!(err.syntax_error(), Some(&SyntaxError::UnmatchedClose(']')));
    }

    #[test]
    fn end_marker_ends_the_stream() {
        assert_eq!(
            tokens(&with_header(&[0x21, 0xFF, 0x23])).unwrap(),
            [Token::Null]
        );
    }

    #[test]
    fn second_header_starts_a_new_document() {
        let mut input = with_header(&[0xFA, 0x80, b'a', 0xC2, 0xFB]);
        input.extend_from_slice(&HEADER);
        // The name table was cleared, so a reference to entry 0 is invalid.
        input.extend_from_slice(&[0xFA, 0x40, 0xC2, 0xFB]);
        let err = tokens(&input).unwrap_err();
        assert!(matches!(
            err.syntax_error(),
            Some(SyntaxError::InvalidBackReference { index: 0, .. })
        ));
    }

    #[test]
    fn numbers() {
        let mut body = vec![0xF8, 0x24, 0xA0, 0x25];
        vint::write_vint(&mut body, vint::zigzag64(-(1 << 40)));
        body.push(0x29);
        vint::write_f64(&mut body, 2.5);
        body.push(0xF9);
        let input = with_header(&body);
        let mut parser = SmileParser::new(&input[..]);
        parser.next_token().unwrap();
        parser.next_token().unwrap();
        assert_eq!(parser.number_value().unwrap(), Number::Int(16));
        parser.next_token().unwrap();
        assert_eq!(parser.number_type().unwrap(), NumberType::Long);
        assert_eq!(parser.i64_value().unwrap(), -(1 << 40));
        assert!(parser.i32_value().is_err());
        parser.next_token().unwrap();
        assert_eq!(parser.f64_value().unwrap(), 2.5);
        assert_eq!(parser.text().as_deref(), Some("2.5"));
    }
}
