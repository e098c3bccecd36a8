//! Shared configuration and state for creating parsers and generators.
//!
//! A factory owns the root symbol tables and the buffer pool. Every parser
//! it creates interns names through a child of the matching root and offers
//! the names it learned back to that root when it finishes, so later parsers
//! of the same factory start with a warm table.

use std::{
    io::{self, Read, Write},
    sync::Arc,
};

use crate::{
    json::{CharsReader, GeneratorOptions, JsonEncoding, JsonGenerator, JsonParser, JsonReader, ParserOptions},
    recycler::{BufferRecycler, IoContext},
    smile::{SmileGenerator, SmileOptions, SmileParser},
    symbols::{ByteQuadsCanonicalizer, CharsToNameCanonicalizer, Interner, Seed},
};

/// Creates parsers and generators for both formats.
///
/// Cloning is cheap and shares the symbol table roots and the buffer pool.
///
/// ```
/// use jsoncore::{CodecFactory, TokenStream, Token};
///
/// let factory = CodecFactory::new();
/// let mut parser = factory.create_parser_from_str(r#"{"id": 7}"#);
/// assert_eq!(parser.next_token().unwrap(), Some(Token::StartObject));
/// ```
#[derive(Debug, Clone)]
pub struct CodecFactory {
    recycler: Arc<BufferRecycler>,
    chars_root: CharsToNameCanonicalizer,
    quads_root: ByteQuadsCanonicalizer,
    parser_options: ParserOptions,
    generator_options: GeneratorOptions,
    smile_options: SmileOptions,
}

impl Default for CodecFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecFactory {
    /// Factory with default options, randomly seeded symbol tables and the
    /// process-wide buffer pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(Seed::Random)
    }

    /// Factory whose symbol tables hash with `seed`.
    #[must_use]
    pub fn with_seed(seed: Seed) -> Self {
        Self {
            recycler: BufferRecycler::global(),
            chars_root: CharsToNameCanonicalizer::new(seed),
            quads_root: ByteQuadsCanonicalizer::new(seed),
            parser_options: ParserOptions::default(),
            generator_options: GeneratorOptions::default(),
            smile_options: SmileOptions::default(),
        }
    }

    #[must_use]
    pub fn with_recycler(mut self, recycler: Arc<BufferRecycler>) -> Self {
        self.recycler = recycler;
        self
    }

    #[must_use]
    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser_options = options;
        self
    }

    #[must_use]
    pub fn with_generator_options(mut self, options: GeneratorOptions) -> Self {
        self.generator_options = options;
        self
    }

    #[must_use]
    pub fn with_smile_options(mut self, options: SmileOptions) -> Self {
        self.smile_options = options;
        self
    }

    #[must_use]
    pub fn parser_options(&self) -> &ParserOptions {
        &self.parser_options
    }

    #[must_use]
    pub fn generator_options(&self) -> &GeneratorOptions {
        &self.generator_options
    }

    #[must_use]
    pub fn smile_options(&self) -> &SmileOptions {
        &self.smile_options
    }

    #[must_use]
    pub fn recycler(&self) -> &Arc<BufferRecycler> {
        &self.recycler
    }

    /// Root of the table used for names decoded from characters.
    #[must_use]
    pub fn chars_canonicalizer(&self) -> &CharsToNameCanonicalizer {
        &self.chars_root
    }

    /// Root of the table used for names read as UTF-8 bytes.
    #[must_use]
    pub fn quads_canonicalizer(&self) -> &ByteQuadsCanonicalizer {
        &self.quads_root
    }

    fn io_context(&self) -> IoContext {
        IoContext::new(self.recycler.clone())
    }

    fn interner_for(&self, encoding: JsonEncoding) -> Interner {
        match encoding {
            JsonEncoding::Utf8 => Interner::Quads(self.quads_root.make_child()),
            _ => Interner::Chars(self.chars_root.make_child()),
        }
    }

    /// Text parser over bytes in any supported Unicode encoding. Unless
    /// `detect_encoding` is off, the first bytes are read here to pick the
    /// encoding.
    ///
    /// # Errors
    ///
    /// Read failure while sniffing the encoding.
    pub fn create_parser<R: Read>(&self, reader: R) -> io::Result<JsonParser<JsonReader<R>>> {
        if !self.parser_options.detect_encoding {
            return Ok(self.create_parser_with_encoding(reader, JsonEncoding::Utf8));
        }
        let (encoding, reader) = JsonReader::detect(reader)?;
        log::trace!("detected {encoding:?} input");
        Ok(JsonParser::with_parts(
            reader,
            self.io_context(),
            self.interner_for(encoding),
            self.parser_options,
        ))
    }

    /// Text parser over bytes known to be in `encoding`. Any byte order mark
    /// must already have been skipped.
    pub fn create_parser_with_encoding<R: Read>(
        &self,
        reader: R,
        encoding: JsonEncoding,
    ) -> JsonParser<JsonReader<R>> {
        JsonParser::with_parts(
            JsonReader::with_encoding(reader, encoding),
            self.io_context(),
            self.interner_for(encoding),
            self.parser_options,
        )
    }

    /// Text parser over UTF-8 bytes in memory.
    pub fn create_parser_from_slice<'a>(&self, input: &'a [u8]) -> JsonParser<&'a [u8]> {
        JsonParser::with_parts(
            input,
            self.io_context(),
            self.interner_for(JsonEncoding::Utf8),
            self.parser_options,
        )
    }

    pub fn create_parser_from_str<'a>(&self, input: &'a str) -> JsonParser<&'a [u8]> {
        self.create_parser_from_slice(input.as_bytes())
    }

    /// Text parser over a character stream. Names go through the chars
    /// table.
    pub fn create_char_parser<I>(&self, chars: I) -> JsonParser<CharsReader<I>>
    where
        I: Iterator<Item = char>,
    {
        JsonParser::with_parts(
            CharsReader::new(chars),
            self.io_context(),
            Interner::Chars(self.chars_root.make_child()),
            self.parser_options,
        )
    }

    pub fn create_generator<W: Write>(&self, writer: W) -> JsonGenerator<W> {
        JsonGenerator::with_parts(writer, self.io_context(), self.generator_options)
    }

    pub fn create_smile_parser<R: Read>(&self, reader: R) -> SmileParser<R> {
        SmileParser::with_parts(
            reader,
            self.io_context(),
            Interner::Quads(self.quads_root.make_child()),
            self.smile_options,
        )
    }

    pub fn create_smile_parser_from_slice<'a>(&self, input: &'a [u8]) -> SmileParser<&'a [u8]> {
        self.create_smile_parser(input)
    }

    pub fn create_smile_generator<W: Write>(&self, writer: W) -> SmileGenerator<W> {
        SmileGenerator::with_parts(writer, self.io_context(), self.smile_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stream::TokenStream, token::Token};

    fn drain(parser: &mut impl TokenStream) {
        while parser.next_token().unwrap().is_some() {}
    }

    #[test]
    fn parsers_share_names_through_the_root() {
        let factory = CodecFactory::with_seed(Seed::Fixed(7));
        assert!(!factory.quads_canonicalizer().contains("alpha"));
        {
            let mut parser = factory.create_parser_from_str(r#"{"alpha":1,"beta":2}"#);
            drain(&mut parser);
        }
        assert!(factory.quads_canonicalizer().contains("alpha"));
        assert!(factory.quads_canonicalizer().contains("beta"));
        assert!(!factory.chars_canonicalizer().contains("alpha"));
    }

    #[test]
    fn wide_input_uses_the_chars_table() {
        let factory = CodecFactory::with_seed(Seed::Fixed(7));
        let utf16: Vec<u8> = r#"{"wide":true}"#
            .encode_utf16()
            .flat_map(u16::to_be_bytes)
            .collect();
        {
            let mut parser = factory.create_parser(&utf16[..]).unwrap();
            assert_eq!(parser.next_token().unwrap(), Some(Token::StartObject));
            assert_eq!(parser.next_token().unwrap(), Some(Token::FieldName));
            assert_eq!(parser.text().as_deref(), Some("wide"));
            drain(&mut parser);
        }
        assert!(factory.chars_canonicalizer().contains("wide"));
    }

    #[test]
    fn clones_share_state() {
        let factory = CodecFactory::with_seed(Seed::Fixed(1));
        let clone = factory.clone();
        {
            let mut parser = clone.create_smile_parser_from_slice(&[
                0x3A, 0x29, 0x0A, 0x01, 0xFA, 0x82, b'k', b'e', b'y', 0x21, 0xFB,
            ]);
            drain(&mut parser);
        }
        assert!(factory.quads_canonicalizer().contains("key"));
        assert!(Arc::ptr_eq(factory.recycler(), clone.recycler()));
    }
}
