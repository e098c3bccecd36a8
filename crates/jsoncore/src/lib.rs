//! Streaming codecs for the JSON token grammar.
//!
//! Two wire formats share one token model: JSON text ([`JsonParser`],
//! [`JsonGenerator`]) and the Smile binary format ([`SmileParser`],
//! [`SmileGenerator`]). Parsers are pull-style [`TokenStream`]s, generators
//! are push-style [`TokenSink`]s, and [`transcode`] pipes one into the other.
//!
//! Field names are interned through symbol tables that are shared, with
//! copy-on-write semantics, by every parser created from the same
//! [`CodecFactory`]. Scratch buffers come from a [`BufferRecycler`] pool.
//!
//! ```
//! use jsoncore::{CodecFactory, transcode};
//!
//! let factory = CodecFactory::new();
//! let mut smile = Vec::new();
//! let mut parser = factory.create_parser_from_str(r#"{"tags":["a","b"],"n":1.5}"#);
//! let mut generator = factory.create_smile_generator(&mut smile);
//! transcode(&mut parser, &mut generator).unwrap();
//! drop(generator);
//!
//! let mut text = Vec::new();
//! let mut parser = factory.create_smile_parser_from_slice(&smile);
//! let mut generator = factory.create_generator(&mut text);
//! transcode(&mut parser, &mut generator).unwrap();
//! drop(generator);
//! assert_eq!(text, br#"{"tags":["a","b"],"n":1.5}"#);
//! ```

#![allow(missing_docs)]

pub mod context;
pub mod error;
pub mod factory;
mod input;
pub mod json;
mod numbers;
pub mod recycler;
pub mod smile;
pub mod stream;
pub mod symbols;
pub mod token;

#[cfg(test)]
mod tests;

pub use context::{ContextKind, ContextStack, Frame};
pub use error::{GeneratorError, Location, ParserError, StructureError, SyntaxError, TranscodeError};
pub use factory::CodecFactory;
pub use json::{GeneratorOptions, JsonEncoding, JsonGenerator, JsonParser, ParserOptions};
pub use recycler::{BufferRecycler, ByteBufferKind, CharBufferKind, IoContext, Recycled};
pub use smile::{SharedOverflow, SmileGenerator, SmileHeader, SmileOptions, SmileParser};
pub use stream::{TokenSink, TokenStream, copy_current_event, copy_current_structure, transcode};
pub use symbols::{
    ByteQuadsCanonicalizer, CharsToNameCanonicalizer, CollisionLimitError, Name, Seed, TableStats,
};
pub use token::{Number, NumberType, Token};
